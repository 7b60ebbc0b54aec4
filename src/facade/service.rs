use super::request::{BatchRequest, SpeechRequest, TextRequest};
use crate::cache::AudioCache;
use crate::config::OrchestratorConfig;
use crate::manager::{Fallback, ProviderFailure, SpeechManager, TextManager};
use crate::provider::GenerationKind;
use crate::resilience::{QuotaInfo, RateLimiter};
use crate::types::{GenerationResult, SpeechResult, StructuredResult};
use crate::usage::{UsageContext, UsageTracker};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one [`GenerationService::run_maintenance`] sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub quota_buckets_removed: usize,
    pub cache_entries_removed: usize,
}

/// Entry point for application code.
///
/// Quota is charged only after a provider succeeded, and only for text.
/// Usage rows are written for every attempt; a failing usage store is
/// logged and never fails a request that already succeeded.
pub struct GenerationService {
    text: Arc<TextManager>,
    speech: Arc<SpeechManager>,
    limiter: Arc<RateLimiter>,
    cache: Arc<AudioCache>,
    usage: Arc<UsageTracker>,
}

impl GenerationService {
    pub fn new(
        text: Arc<TextManager>,
        speech: Arc<SpeechManager>,
        limiter: Arc<RateLimiter>,
        cache: Arc<AudioCache>,
        usage: Arc<UsageTracker>,
    ) -> Self {
        Self {
            text,
            speech,
            limiter,
            cache,
            usage,
        }
    }

    /// Managers, limiter and cache from configuration, with in-memory
    /// stores. Configured HTTP providers are registered when the
    /// `http-providers` feature is enabled; others can be added later
    /// through [`text`](Self::text) and [`speech`](Self::speech).
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self> {
        config.validate()?;
        let text = Arc::new(TextManager::new(
            GenerationKind::Text,
            config.generation_enabled,
            config.text.order(),
        ));
        let speech = Arc::new(SpeechManager::new(
            GenerationKind::Speech,
            config.generation_enabled,
            config.speech.order(),
        ));

        #[cfg(feature = "http-providers")]
        for (id, settings) in &config.providers {
            match settings.kind.generation_kind() {
                GenerationKind::Text => {
                    text.register_provider(
                        id.clone(),
                        crate::providers::text_provider_from_settings(id, settings)?,
                    );
                }
                GenerationKind::Speech => {
                    speech.register_provider(
                        id.clone(),
                        crate::providers::speech_provider_from_settings(id, settings)?,
                    );
                }
            }
        }

        #[cfg(not(feature = "http-providers"))]
        if !config.providers.is_empty() {
            tracing::warn!(
                providers = config.providers.len(),
                "http-providers feature disabled; configured providers must be registered manually"
            );
        }

        Ok(Self::new(
            text,
            speech,
            Arc::new(RateLimiter::new(config.quota.clone())),
            Arc::new(AudioCache::in_memory(config.cache.clone())),
            Arc::new(UsageTracker::in_memory()),
        ))
    }

    pub fn text(&self) -> &Arc<TextManager> {
        &self.text
    }

    pub fn speech(&self) -> &Arc<SpeechManager> {
        &self.speech
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn cache(&self) -> &Arc<AudioCache> {
        &self.cache
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    pub async fn generate(&self, request: &TextRequest) -> Result<GenerationResult> {
        let ctx = request.usage_context();
        self.limiter
            .check_limits(&request.user_id, request.items)
            .await?;

        let outcome = self.text.generate(&request.prompt, &request.options).await;
        let fallback = self.settle(&ctx, GenerationKind::Text, outcome).await?;

        self.charge(&request.user_id, request.items).await;
        self.log(self.usage.log_text_success(&ctx, &fallback.value).await);
        Ok(fallback.into_inner())
    }

    pub async fn generate_structured(
        &self,
        request: &TextRequest,
        schema: &serde_json::Value,
    ) -> Result<StructuredResult> {
        let ctx = request.usage_context();
        self.limiter
            .check_limits(&request.user_id, request.items)
            .await?;

        let outcome = self
            .text
            .generate_structured(&request.prompt, schema, &request.options)
            .await;
        let fallback = self.settle(&ctx, GenerationKind::Text, outcome).await?;

        self.charge(&request.user_id, request.items).await;
        self.log(self.usage.log_text_success(&ctx, &fallback.value.result).await);
        Ok(fallback.into_inner())
    }

    /// One quota item per prompt; results come from a single provider.
    pub async fn generate_batch(&self, request: &BatchRequest) -> Result<Vec<GenerationResult>> {
        if request.prompts.is_empty() {
            return Ok(Vec::new());
        }
        let ctx = request.usage_context();
        let items = u32::try_from(request.prompts.len()).unwrap_or(u32::MAX);
        self.limiter.check_limits(&request.user_id, items).await?;

        let outcome = self
            .text
            .generate_batch(&request.prompts, &request.options)
            .await;
        let fallback = self.settle(&ctx, GenerationKind::Text, outcome).await?;

        self.charge(&request.user_id, items).await;
        for result in &fallback.value {
            self.log(self.usage.log_text_success(&ctx, result).await);
        }
        Ok(fallback.into_inner())
    }

    /// Cached audio is returned without touching a provider and logged as
    /// a zero-cost `cached` row.
    pub async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechResult> {
        let ctx = request.usage_context();
        let opts = &request.options;
        let key = AudioCache::cache_key(&request.text, &opts.language, &opts.voice, opts.format);
        let started = Instant::now();
        let characters = u32::try_from(request.text.chars().count()).unwrap_or(u32::MAX);

        if let Some(audio) = self.cache.get(&key).await {
            let latency_ms = started.elapsed().as_millis() as u64;
            self.log(self.usage.log_cache_hit(&ctx, characters, latency_ms).await);
            return Ok(SpeechResult {
                audio,
                format: opts.format,
                provider: "cache".to_string(),
                model: String::new(),
                voice: opts.voice.clone(),
                characters,
                estimated_cost_usd: 0.0,
                latency_ms,
            });
        }

        let outcome = self.speech.synthesize(&request.text, opts).await;
        let fallback = self.settle(&ctx, GenerationKind::Speech, outcome).await?;

        if let Err(e) = self.cache.set(&key, fallback.value.audio.clone()).await {
            tracing::warn!(key = %key, error = %e, "failed to cache synthesized audio");
        }
        self.log(self.usage.log_speech_success(&ctx, &fallback.value).await);
        Ok(fallback.into_inner())
    }

    pub async fn quota_info(&self, user_id: &str) -> Result<QuotaInfo> {
        self.limiter.get_quota_info(user_id).await
    }

    /// Drop quota buckets older than `days_to_keep` and expired audio.
    pub async fn run_maintenance(&self, days_to_keep: u32) -> Result<MaintenanceReport> {
        Ok(MaintenanceReport {
            quota_buckets_removed: self.limiter.cleanup_old_data(days_to_keep).await?,
            cache_entries_removed: self.cache.cleanup_expired().await?,
        })
    }

    /// Write one failure row per swallowed or fatal provider attempt.
    async fn settle<T>(
        &self,
        ctx: &UsageContext,
        kind: GenerationKind,
        outcome: Result<Fallback<T>>,
    ) -> Result<Fallback<T>> {
        match outcome {
            Ok(fallback) => {
                self.log_failures(ctx, kind, &fallback.failures).await;
                Ok(fallback)
            }
            Err(err) => {
                self.log_failures(ctx, kind, err.failures()).await;
                Err(err)
            }
        }
    }

    async fn log_failures(&self, ctx: &UsageContext, kind: GenerationKind, failures: &[ProviderFailure]) {
        for failure in failures {
            self.log(self.usage.log_failure(ctx, kind, failure).await);
        }
    }

    async fn charge(&self, user_id: &str, items: u32) {
        if let Err(e) = self.limiter.record_usage(user_id, items).await {
            tracing::error!(user_id, items, error = %e, "failed to record quota usage");
        }
    }

    fn log(&self, outcome: Result<()>) {
        if let Err(e) = outcome {
            tracing::warn!(error = %e, code = %e.code(), "usage row not recorded");
        }
    }
}

impl std::fmt::Debug for GenerationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationService")
            .field("text_providers", &self.text.registered())
            .field("speech_providers", &self.speech.registered())
            .field("cache_backend", &self.cache.backend_name())
            .finish()
    }
}

