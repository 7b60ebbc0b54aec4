use crate::provider::GenerationKind;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One accounting row per provider attempt or cache hit.
///
/// Rows are append-only; stores hand out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub operation: GenerationKind,
    pub activity_type: Option<String>,
    pub provider: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub characters: u32,
    pub estimated_cost_usd: f64,
    pub duration_ms: u64,
    pub success: bool,
    pub error: Option<String>,
    pub user_id: Option<String>,
    pub cached: bool,
}

impl UsageRecord {
    /// Blank row stamped now; callers fill in what they know.
    pub fn new(operation: GenerationKind, provider: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            operation,
            activity_type: None,
            provider: provider.into(),
            model: String::new(),
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            characters: 0,
            estimated_cost_usd: 0.0,
            duration_ms: 0,
            success: true,
            error: None,
            user_id: None,
            cached: false,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// `YYYY-MM` bucket used for monthly generation counters.
    pub fn month(&self) -> String {
        month_key(self.timestamp)
    }

    /// Whether this row adds one to the user's monthly generation count.
    pub fn counts_as_generation(&self) -> bool {
        self.operation == GenerationKind::Text
            && self.success
            && !self.cached
            && self.user_id.is_some()
    }
}

pub fn month_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Row selection for queries and aggregations. Empty filter matches all.
#[derive(Debug, Clone, Default)]
pub struct UsageFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
    pub provider: Option<String>,
    pub operation: Option<GenerationKind>,
}

impl UsageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, at: DateTime<Utc>) -> Self {
        self.since = Some(at);
        self
    }

    pub fn until(mut self, at: DateTime<Utc>) -> Self {
        self.until = Some(at);
        self
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn operation(mut self, operation: GenerationKind) -> Self {
        self.operation = Some(operation);
        self
    }

    /// `since` inclusive, `until` exclusive.
    pub fn matches(&self, record: &UsageRecord) -> bool {
        if let Some(since) = self.since {
            if record.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.timestamp >= until {
                return false;
            }
        }
        if let Some(ref user) = self.user_id {
            if record.user_id.as_deref() != Some(user.as_str()) {
                return false;
            }
        }
        if let Some(ref provider) = self.provider {
            if &record.provider != provider {
                return false;
            }
        }
        if let Some(op) = self.operation {
            if record.operation != op {
                return false;
            }
        }
        true
    }
}
