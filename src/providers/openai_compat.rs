//! Chat-completions text provider.

use super::{error_from_response, http_client, DEFAULT_TIMEOUT};
use crate::provider::{Provider, ProviderError, TextProvider};
use crate::tokens::{CharacterEstimator, ModelPricing, TokenCounter};
use crate::types::{GenerationOptions, GenerationResult, ResponseFormat, TokenUsage};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub(crate) const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiCompatProvider {
    name: String,
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    pricing: ModelPricing,
    estimator: CharacterEstimator,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl OpenAiCompatProvider {
    pub fn builder(name: impl Into<String>) -> OpenAiCompatProviderBuilder {
        OpenAiCompatProviderBuilder::new(name)
    }

    fn request_body(&self, prompt: &str, options: &GenerationOptions) -> Value {
        let mut body = json!({
            "model": options.model().unwrap_or(self.model.as_str()),
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": options.temperature(),
            "max_tokens": options.max_tokens(),
            "top_p": options.top_p(),
        });
        if !options.stop().is_empty() {
            body["stop"] = json!(options.stop());
        }
        if options.response_format() == Some(ResponseFormat::Json) {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

#[async_trait]
impl TextProvider for OpenAiCompatProvider {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<GenerationResult, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::authentication(&self.name, "no API key configured"))?;
        let url = format!("{}/chat/completions", self.base_url);
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.request_body(prompt, options))
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&self.name, &e))?;

        if !response.status().is_success() {
            return Err(error_from_response(&self.name, response).await);
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(&self.name, &e))?;
        let parsed: ChatResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::other(&self.name, format!("malformed response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::other(&self.name, "response contained no content"))?;

        let model = parsed
            .model
            .unwrap_or_else(|| options.model().unwrap_or(self.model.as_str()).to_string());
        let (prompt_tokens, completion_tokens) = match parsed.usage {
            Some(u) => (u.prompt_tokens, u.completion_tokens),
            None => (
                self.estimator.count_u32(prompt),
                self.estimator.count_u32(&content),
            ),
        };
        let latency_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            provider = %self.name,
            model = %model,
            prompt_tokens,
            completion_tokens,
            latency_ms,
            "chat completion received"
        );

        Ok(GenerationResult {
            content,
            usage: TokenUsage::new(prompt_tokens, completion_tokens, &self.pricing),
            model,
            provider: self.name.clone(),
            latency_ms,
            raw: Some(raw),
        })
    }
}

pub struct OpenAiCompatProviderBuilder {
    name: String,
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout: Duration,
    pricing: Option<ModelPricing>,
}

impl OpenAiCompatProviderBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: None,
            api_key: None,
            model: None,
            timeout: DEFAULT_TIMEOUT,
            pricing: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pricing(mut self, pricing: ModelPricing) -> Self {
        self.pricing = Some(pricing);
        self
    }

    pub fn build(self) -> Result<OpenAiCompatProvider> {
        if self.name.trim().is_empty() {
            return Err(Error::configuration("provider name must not be empty"));
        }
        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let pricing = self.pricing.unwrap_or_else(|| {
            ModelPricing::for_model(&model).unwrap_or_else(|| ModelPricing::free(&model))
        });
        Ok(OpenAiCompatProvider {
            client: http_client(&self.name, self.timeout)?,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: self.api_key.filter(|k| !k.is_empty()),
            name: self.name,
            model,
            pricing,
            estimator: CharacterEstimator::new(),
        })
    }
}
