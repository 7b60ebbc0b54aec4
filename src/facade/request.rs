use crate::types::{GenerationOptions, SpeechOptions};
use crate::usage::UsageContext;

/// One text generation on behalf of a user.
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub user_id: String,
    pub activity_type: Option<String>,
    pub prompt: String,
    pub options: GenerationOptions,
    /// Items this call produces, charged against the user's quota.
    pub items: u32,
}

impl TextRequest {
    pub fn new(user_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            activity_type: None,
            prompt: prompt.into(),
            options: GenerationOptions::default(),
            items: 1,
        }
    }

    pub fn activity(mut self, activity_type: impl Into<String>) -> Self {
        self.activity_type = Some(activity_type.into());
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn items(mut self, items: u32) -> Self {
        self.items = items;
        self
    }

    pub(crate) fn usage_context(&self) -> UsageContext {
        let ctx = UsageContext::new().user(self.user_id.clone());
        match &self.activity_type {
            Some(a) => ctx.activity(a.clone()),
            None => ctx,
        }
    }
}

/// Several prompts answered by one provider; one quota item per prompt.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub user_id: String,
    pub activity_type: Option<String>,
    pub prompts: Vec<String>,
    pub options: GenerationOptions,
}

impl BatchRequest {
    pub fn new(user_id: impl Into<String>, prompts: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            activity_type: None,
            prompts,
            options: GenerationOptions::default(),
        }
    }

    pub fn activity(mut self, activity_type: impl Into<String>) -> Self {
        self.activity_type = Some(activity_type.into());
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn usage_context(&self) -> UsageContext {
        let ctx = UsageContext::new().user(self.user_id.clone());
        match &self.activity_type {
            Some(a) => ctx.activity(a.clone()),
            None => ctx,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub user_id: Option<String>,
    pub activity_type: Option<String>,
    pub text: String,
    pub options: SpeechOptions,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, options: SpeechOptions) -> Self {
        Self {
            user_id: None,
            activity_type: None,
            text: text.into(),
            options,
        }
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn activity(mut self, activity_type: impl Into<String>) -> Self {
        self.activity_type = Some(activity_type.into());
        self
    }

    pub(crate) fn usage_context(&self) -> UsageContext {
        UsageContext {
            user_id: self.user_id.clone(),
            activity_type: self.activity_type.clone(),
        }
    }
}
