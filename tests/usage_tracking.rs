//! Usage rows written by the service.

mod common;

use ai_gen_orchestrator::cache::{AudioCache, CacheConfig};
use ai_gen_orchestrator::prelude::*;
use ai_gen_orchestrator::usage::{month_key, UsageFilter, UsageRecord, UsageStore};
use async_trait::async_trait;
use common::{service, speech_manager, text_manager, ScriptedSpeech, ScriptedText};
use std::sync::Arc;

#[tokio::test]
async fn test_one_row_per_attempt() {
    let text = text_manager(true, &["deepseek", "gemini"]);
    text.register_provider(
        "deepseek",
        ScriptedText::failing("deepseek", ProviderError::timeout("deepseek", "30s elapsed")),
    );
    text.register_provider("gemini", ScriptedText::replying("gemini", "ok"));
    let svc = service(text, speech_manager(&[]), RateLimiterConfig::new());

    svc.generate(&TextRequest::new("alice", "q").activity("quiz"))
        .await
        .unwrap();

    let rows = svc.usage().records(&UsageFilter::new()).await.unwrap();
    assert_eq!(rows.len(), 2);
    let failed: Vec<_> = rows.iter().filter(|r| !r.success).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].provider, "deepseek");
    assert!(failed[0].error.as_deref().unwrap_or_default().contains("30s elapsed"));
    assert!(rows.iter().all(|r| r.activity_type.as_deref() == Some("quiz")));
    assert!(rows.iter().all(|r| r.user_id.as_deref() == Some("alice")));

    let month = month_key(chrono::Utc::now());
    assert_eq!(svc.usage().monthly_generations("alice", &month).await.unwrap(), 1);

    let by_provider = svc.usage().by_provider(&UsageFilter::new()).await.unwrap();
    assert!((by_provider["gemini"].cost_usd - 0.42).abs() < 1e-9);
    assert_eq!(by_provider["deepseek"].cost_usd, 0.0);
}

#[tokio::test]
async fn test_total_failure_still_logs_every_attempt() {
    let text = text_manager(true, &["deepseek", "gemini"]);
    text.register_provider(
        "deepseek",
        ScriptedText::failing("deepseek", ProviderError::connection("deepseek", "refused")),
    );
    text.register_provider(
        "gemini",
        ScriptedText::failing("gemini", ProviderError::other("gemini", "HTTP 500")),
    );
    let svc = service(text, speech_manager(&[]), RateLimiterConfig::new());

    assert!(svc.generate(&TextRequest::new("bob", "q")).await.is_err());

    let summary = svc.usage().summary(&UsageFilter::new().user("bob")).await.unwrap();
    assert_eq!(summary.requests, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.error_rate(), 1.0);
    let month = month_key(chrono::Utc::now());
    assert_eq!(svc.usage().monthly_generations("bob", &month).await.unwrap(), 0);
}

#[tokio::test]
async fn test_cache_hit_logged_as_cached_zero_cost_row() {
    let speech = speech_manager(&["azure"]);
    let provider = ScriptedSpeech::replying("azure");
    speech.register_provider("azure", provider.clone());
    let svc = service(text_manager(true, &[]), speech, RateLimiterConfig::new());

    let request = SpeechRequest::new("Good morning", SpeechOptions::new("en", "jenny")).user("carol");
    let first = svc.synthesize(&request).await.unwrap();
    let second = svc.synthesize(&request).await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(first.audio, second.audio);
    assert_eq!(second.provider, "cache");
    assert_eq!(second.estimated_cost_usd, 0.0);

    let rows = svc
        .usage()
        .records(&UsageFilter::new().operation(GenerationKind::Speech))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    let cached: Vec<_> = rows.iter().filter(|r| r.cached).collect();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].estimated_cost_usd, 0.0);
    assert_eq!(cached[0].characters, 12);
}

struct BrokenStore;

#[async_trait]
impl UsageStore for BrokenStore {
    async fn append(&self, _record: UsageRecord, _count: bool) -> ai_gen_orchestrator::Result<()> {
        Err(Error::configuration("usage database offline"))
    }

    async fn records(&self, _filter: &UsageFilter) -> ai_gen_orchestrator::Result<Vec<UsageRecord>> {
        Ok(Vec::new())
    }

    async fn monthly_generations(&self, _user: &str, _month: &str) -> ai_gen_orchestrator::Result<u32> {
        Ok(0)
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn test_usage_store_failure_does_not_fail_request() {
    let text = text_manager(true, &["deepseek"]);
    text.register_provider("deepseek", ScriptedText::replying("deepseek", "ok"));
    let svc = GenerationService::new(
        text,
        speech_manager(&[]),
        Arc::new(RateLimiter::new(RateLimiterConfig::new())),
        Arc::new(AudioCache::in_memory(CacheConfig::new())),
        Arc::new(UsageTracker::new(Arc::new(BrokenStore))),
    );

    let result = svc.generate(&TextRequest::new("dave", "q")).await.unwrap();
    assert_eq!(result.content, "ok");
    assert_eq!(svc.rate_limiter().get_usage("dave").await.unwrap(), 1);
}
