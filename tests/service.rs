//! Service construction and option handling.

mod common;

use ai_gen_orchestrator::prelude::*;
use ai_gen_orchestrator::tokens::ModelPricing;
use ai_gen_orchestrator::types::TokenUsage;
use ai_gen_orchestrator::usage::UsageFilter;
use common::{service, speech_manager, text_manager, ScriptedText};
use std::time::Duration;

#[test]
fn test_out_of_range_options_rejected() {
    assert!(matches!(
        GenerationOptions::new(2.5, 100),
        Err(Error::InvalidOptions { field: "temperature", .. })
    ));
    assert!(matches!(
        GenerationOptions::new(0.7, 0),
        Err(Error::InvalidOptions { field: "max_tokens", .. })
    ));
    assert!(GenerationOptions::new(0.0, 1).is_ok());
    assert!(GenerationOptions::new(2.0, 100_000).is_ok());
}

#[test]
fn test_cost_for_a_million_tokens_each_way() {
    let usage = TokenUsage::new(1_000_000, 1_000_000, &ModelPricing::new("m", 0.14, 0.28));
    assert!((usage.estimated_cost_usd() - 0.42).abs() < 1e-9);
    assert_eq!(usage.total_tokens(), 2_000_000);
}

#[cfg(feature = "http-providers")]
#[tokio::test]
async fn test_from_config_registers_configured_providers() {
    let yaml = r#"
text:
  primary: deepseek
  fallback: gemini
speech:
  primary: openai-tts
quota:
  daily_limit: 40
providers:
  deepseek:
    kind: openai_compat
    base_url: https://api.deepseek.com
    model: deepseek-chat
    api_key: sk-test
  gemini:
    kind: openai_compat
    base_url: https://generativelanguage.example.com/v1beta/openai
    api_key: ""
    api_key_env: GENORCH_TEST_UNSET_GEMINI_KEY
  openai-tts:
    kind: openai_speech
    api_key: sk-tts
"#;
    let config = OrchestratorConfig::from_yaml_str(yaml).unwrap();
    let svc = GenerationService::from_config(&config).unwrap();

    assert_eq!(
        svc.text().registered(),
        vec![ProviderId::new("deepseek"), ProviderId::new("gemini")]
    );
    let candidates: Vec<_> = svc.text().candidates().into_iter().map(|(id, _)| id).collect();
    assert_eq!(candidates, vec![ProviderId::new("deepseek")]);
    assert_eq!(svc.speech().registered(), vec![ProviderId::new("openai-tts")]);
    assert_eq!(svc.rate_limiter().config().daily_limit, 40);
    assert_eq!(svc.quota_info("anyone").await.unwrap().remaining, 40);
}

#[tokio::test]
async fn test_disabled_config_blocks_generation() {
    let yaml = "generation_enabled: false\n";
    let config = OrchestratorConfig::from_yaml_str(yaml).unwrap();
    let svc = GenerationService::from_config(&config).unwrap();
    svc.text().register_provider("deepseek", ScriptedText::replying("deepseek", "ok"));

    let err = svc.generate(&TextRequest::new("u1", "q")).await.unwrap_err();
    assert!(matches!(err, Error::GenerationDisabled { .. }));
    assert_eq!(svc.rate_limiter().get_usage("u1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_structured_generation_through_service() {
    let text = text_manager(true, &["deepseek"]);
    text.register_provider(
        "deepseek",
        ScriptedText::replying("deepseek", r#"{"cards": [{"front": "H2O", "back": "water"}]}"#),
    );
    let svc = service(text, speech_manager(&[]), RateLimiterConfig::new());
    let schema = serde_json::json!({
        "type": "object",
        "required": ["cards"],
        "properties": { "cards": { "type": "array", "minItems": 1 } }
    });

    let structured = svc
        .generate_structured(&TextRequest::new("u1", "flashcards").activity("flashcards"), &schema)
        .await
        .unwrap();

    assert_eq!(structured.value["cards"][0]["back"], "water");
    assert_eq!(svc.rate_limiter().get_usage("u1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_maintenance_sweeps_cache_and_quota() {
    let svc = service(text_manager(true, &[]), speech_manager(&[]), RateLimiterConfig::new());
    let report = svc.run_maintenance(30).await.unwrap();
    assert_eq!(report.quota_buckets_removed, 0);
    assert_eq!(report.cache_entries_removed, 0);
}

#[tokio::test]
async fn test_dropped_request_records_nothing() {
    let text = text_manager(true, &["slow"]);
    let slow = ScriptedText::stalled("slow");
    text.register_provider("slow", slow.clone());
    let svc = service(text, speech_manager(&[]), RateLimiterConfig::new());

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        svc.generate(&TextRequest::new("student-9", "q")),
    )
    .await;
    assert!(outcome.is_err());
    assert_eq!(slow.calls(), 1);

    assert_eq!(svc.rate_limiter().get_usage("student-9").await.unwrap(), 0);
    assert!(svc.usage().records(&UsageFilter::new()).await.unwrap().is_empty());
}
