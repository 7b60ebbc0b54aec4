//! Scripted providers shared by the integration tests.

#![allow(dead_code)]

use ai_gen_orchestrator::prelude::*;
use ai_gen_orchestrator::tokens::{CharacterPricing, ModelPricing};
use ai_gen_orchestrator::types::TokenUsage;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub enum Behavior {
    Reply(String),
    Fail(ProviderError),
    /// Never completes.
    Stall,
}

pub struct ScriptedText {
    name: String,
    available: bool,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl ScriptedText {
    pub fn replying(name: &str, content: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            available: true,
            behavior: Behavior::Reply(content.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &str, error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            available: true,
            behavior: Behavior::Fail(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn stalled(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            available: true,
            behavior: Behavior::Stall,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unavailable(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            available: false,
            behavior: Behavior::Reply(String::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for ScriptedText {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        "deepseek-chat"
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

#[async_trait]
impl TextProvider for ScriptedText {
    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> std::result::Result<GenerationResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Reply(content) => Ok(GenerationResult {
                content: content.clone(),
                usage: TokenUsage::new(1_000_000, 1_000_000, &ModelPricing::deepseek_chat()),
                model: "deepseek-chat".into(),
                provider: self.name.clone(),
                latency_ms: 5,
                raw: None,
            }),
            Behavior::Fail(e) => Err(e.clone()),
            Behavior::Stall => std::future::pending().await,
        }
    }
}

pub struct ScriptedSpeech {
    name: String,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl ScriptedSpeech {
    pub fn replying(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            behavior: Behavior::Reply("ID3-audio".into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &str, error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            behavior: Behavior::Fail(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for ScriptedSpeech {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        "neural"
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[async_trait]
impl SpeechProvider for ScriptedSpeech {
    async fn synthesize(
        &self,
        text: &str,
        options: &SpeechOptions,
    ) -> std::result::Result<SpeechResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Reply(audio) => {
                let characters = text.chars().count() as u32;
                Ok(SpeechResult {
                    audio: Bytes::from(audio.clone().into_bytes()),
                    format: options.format,
                    provider: self.name.clone(),
                    model: "neural".into(),
                    voice: options.voice.clone(),
                    characters,
                    estimated_cost_usd: CharacterPricing::azure_neural().calculate_cost(characters),
                    latency_ms: 40,
                })
            }
            Behavior::Fail(e) => Err(e.clone()),
            Behavior::Stall => std::future::pending().await,
        }
    }
}

pub fn text_manager(enabled: bool, priority: &[&str]) -> Arc<TextManager> {
    Arc::new(TextManager::new(
        GenerationKind::Text,
        enabled,
        priority.iter().map(ProviderId::new).collect(),
    ))
}

pub fn speech_manager(priority: &[&str]) -> Arc<SpeechManager> {
    Arc::new(SpeechManager::new(
        GenerationKind::Speech,
        true,
        priority.iter().map(ProviderId::new).collect(),
    ))
}

/// Service over the given managers with in-memory collaborators.
pub fn service(
    text: Arc<TextManager>,
    speech: Arc<SpeechManager>,
    quota: RateLimiterConfig,
) -> GenerationService {
    GenerationService::new(
        text,
        speech,
        Arc::new(RateLimiter::new(quota)),
        Arc::new(AudioCache::in_memory(CacheConfig::new())),
        Arc::new(UsageTracker::in_memory()),
    )
}
