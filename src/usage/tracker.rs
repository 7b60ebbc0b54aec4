use super::record::{UsageFilter, UsageRecord};
use super::store::{InMemoryUsageStore, UsageStore};
use crate::manager::ProviderFailure;
use crate::provider::GenerationKind;
use crate::types::{GenerationResult, SpeechResult};
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Who asked, and for what. Attached to every row of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageContext {
    pub user_id: Option<String>,
    pub activity_type: Option<String>,
}

impl UsageContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn activity(mut self, activity_type: impl Into<String>) -> Self {
        self.activity_type = Some(activity_type.into());
        self
    }

    fn apply(&self, record: &mut UsageRecord) {
        record.user_id = self.user_id.clone();
        record.activity_type = self.activity_type.clone();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSummary {
    pub requests: u64,
    pub successful: u64,
    pub failed: u64,
    pub cached: u64,
    pub total_tokens: u64,
    pub characters: u64,
    pub cost_usd: f64,
    pub total_duration_ms: u64,
}

impl UsageSummary {
    fn add(&mut self, r: &UsageRecord) {
        self.requests += 1;
        if r.success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        if r.cached {
            self.cached += 1;
        }
        self.total_tokens += u64::from(r.total_tokens);
        self.characters += u64::from(r.characters);
        self.cost_usd += r.estimated_cost_usd;
        self.total_duration_ms += r.duration_ms;
    }

    pub fn error_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.failed as f64 / self.requests as f64
        }
    }

    pub fn avg_duration_ms(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / self.requests as f64
        }
    }
}

/// Records every generation attempt and answers cost questions over them.
pub struct UsageTracker {
    store: Arc<dyn UsageStore>,
}

impl UsageTracker {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryUsageStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn UsageStore> {
        &self.store
    }

    /// Append one row. Successful, uncached text rows with a user also bump
    /// that user's monthly generation counter in the same unit of work.
    pub async fn log_usage(&self, record: UsageRecord) -> Result<()> {
        let counts = record.counts_as_generation();
        tracing::debug!(
            operation = %record.operation,
            provider = %record.provider,
            success = record.success,
            cached = record.cached,
            cost_usd = record.estimated_cost_usd,
            "usage recorded"
        );
        self.store.append(record, counts).await
    }

    pub async fn log_text_success(&self, ctx: &UsageContext, result: &GenerationResult) -> Result<()> {
        let mut record = UsageRecord::new(GenerationKind::Text, result.provider.clone());
        ctx.apply(&mut record);
        record.model = result.model.clone();
        record.prompt_tokens = result.usage.prompt_tokens();
        record.completion_tokens = result.usage.completion_tokens();
        record.total_tokens = result.usage.total_tokens();
        record.estimated_cost_usd = result.usage.estimated_cost_usd();
        record.duration_ms = result.latency_ms;
        self.log_usage(record).await
    }

    pub async fn log_speech_success(&self, ctx: &UsageContext, result: &SpeechResult) -> Result<()> {
        let mut record = UsageRecord::new(GenerationKind::Speech, result.provider.clone());
        ctx.apply(&mut record);
        record.model = result.model.clone();
        record.characters = result.characters;
        record.estimated_cost_usd = result.estimated_cost_usd;
        record.duration_ms = result.latency_ms;
        self.log_usage(record).await
    }

    pub async fn log_failure(
        &self,
        ctx: &UsageContext,
        operation: GenerationKind,
        failure: &ProviderFailure,
    ) -> Result<()> {
        let mut record = UsageRecord::new(operation, failure.provider.clone());
        ctx.apply(&mut record);
        record.duration_ms = failure.elapsed_ms;
        record.success = false;
        record.error = Some(failure.error.to_string());
        self.log_usage(record).await
    }

    /// Zero-cost speech row for audio served from cache.
    pub async fn log_cache_hit(&self, ctx: &UsageContext, characters: u32, duration_ms: u64) -> Result<()> {
        let mut record = UsageRecord::new(GenerationKind::Speech, "cache");
        ctx.apply(&mut record);
        record.characters = characters;
        record.duration_ms = duration_ms;
        record.cached = true;
        self.log_usage(record).await
    }

    pub async fn records(&self, filter: &UsageFilter) -> Result<Vec<UsageRecord>> {
        self.store.records(filter).await
    }

    pub async fn monthly_generations(&self, user_id: &str, month: &str) -> Result<u32> {
        self.store.monthly_generations(user_id, month).await
    }

    pub async fn summary(&self, filter: &UsageFilter) -> Result<UsageSummary> {
        let mut summary = UsageSummary::default();
        for r in self.store.records(filter).await? {
            summary.add(&r);
        }
        Ok(summary)
    }

    pub async fn by_provider(&self, filter: &UsageFilter) -> Result<BTreeMap<String, UsageSummary>> {
        self.group(filter, |r| Some(r.provider.clone())).await
    }

    /// Rows without an activity type are grouped under `unspecified`.
    pub async fn by_activity(&self, filter: &UsageFilter) -> Result<BTreeMap<String, UsageSummary>> {
        self.group(filter, |r| {
            Some(r.activity_type.clone().unwrap_or_else(|| "unspecified".to_string()))
        })
        .await
    }

    /// Anonymous rows are left out.
    pub async fn by_user(&self, filter: &UsageFilter) -> Result<BTreeMap<String, UsageSummary>> {
        self.group(filter, |r| r.user_id.clone()).await
    }

    pub async fn by_day(&self, filter: &UsageFilter) -> Result<BTreeMap<NaiveDate, UsageSummary>> {
        self.group(filter, |r| Some(r.day())).await
    }

    pub async fn error_rate(&self, filter: &UsageFilter) -> Result<f64> {
        Ok(self.summary(filter).await?.error_rate())
    }

    async fn group<K: Ord>(
        &self,
        filter: &UsageFilter,
        key: impl Fn(&UsageRecord) -> Option<K>,
    ) -> Result<BTreeMap<K, UsageSummary>> {
        let mut groups: BTreeMap<K, UsageSummary> = BTreeMap::new();
        for r in self.store.records(filter).await? {
            if let Some(k) = key(&r) {
                groups.entry(k).or_default().add(&r);
            }
        }
        Ok(groups)
    }
}
