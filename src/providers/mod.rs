//! HTTP providers for OpenAI-compatible endpoints.
//!
//! Most hosted models (DeepSeek, Gemini's compatibility layer, OpenAI
//! itself) accept the same chat-completions and audio-speech payloads, so
//! one adapter per capability covers them. Each provider maps transport
//! and status failures onto [`ProviderError`](crate::provider::ProviderError)
//! and never retries on its own; retrying is the manager's fallback.

mod openai_compat;
mod openai_speech;

pub use openai_compat::{OpenAiCompatProvider, OpenAiCompatProviderBuilder};
pub use openai_speech::{OpenAiSpeechProvider, OpenAiSpeechProviderBuilder};

use crate::config::{ProviderKind, ProviderSettings};
use crate::provider::{ProviderError, ProviderId, SpeechProvider, TextProvider};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Seconds form of `Retry-After`. HTTP-date values are ignored.
pub(crate) fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Turn a non-success response into a classified error.
pub(crate) async fn error_from_response(provider: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let retry_after = parse_retry_after(&response);
    let body = response.text().await.unwrap_or_default();
    ProviderError::from_status(provider, status, &body, retry_after)
}

pub(crate) fn http_client(provider: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .build()
        .map_err(|e| {
            crate::Error::configuration_with_context(
                format!("failed to create HTTP client: {}", e),
                crate::ErrorContext::new().with_source(provider.to_string()),
            )
        })
}

/// Build a text provider from its configuration entry.
pub fn text_provider_from_settings(
    id: &ProviderId,
    settings: &ProviderSettings,
) -> Result<Arc<dyn TextProvider>> {
    if settings.kind != ProviderKind::OpenaiCompat {
        return Err(crate::Error::configuration(format!(
            "provider '{}' is not a text provider",
            id
        )));
    }
    let mut builder = OpenAiCompatProvider::builder(id.as_str());
    if let Some(base_url) = settings.resolved_base_url(id)? {
        builder = builder.base_url(base_url);
    }
    if let Some(model) = &settings.model {
        builder = builder.model(model.clone());
    }
    if let Some(key) = settings.resolve_api_key(id) {
        builder = builder.api_key(key);
    }
    if let Some(timeout) = settings.timeout() {
        builder = builder.timeout(timeout);
    }
    let model = settings
        .model
        .clone()
        .unwrap_or_else(|| openai_compat::DEFAULT_MODEL.to_string());
    builder = builder.pricing(settings.model_pricing(&model));
    Ok(Arc::new(builder.build()?))
}

/// Build a speech provider from its configuration entry.
pub fn speech_provider_from_settings(
    id: &ProviderId,
    settings: &ProviderSettings,
) -> Result<Arc<dyn SpeechProvider>> {
    if settings.kind != ProviderKind::OpenaiSpeech {
        return Err(crate::Error::configuration(format!(
            "provider '{}' is not a speech provider",
            id
        )));
    }
    let mut builder = OpenAiSpeechProvider::builder(id.as_str());
    if let Some(base_url) = settings.resolved_base_url(id)? {
        builder = builder.base_url(base_url);
    }
    if let Some(model) = &settings.model {
        builder = builder.model(model.clone());
    }
    if let Some(voice) = &settings.voice {
        builder = builder.default_voice(voice.clone());
    }
    if let Some(key) = settings.resolve_api_key(id) {
        builder = builder.api_key(key);
    }
    if let Some(timeout) = settings.timeout() {
        builder = builder.timeout(timeout);
    }
    builder = builder.pricing(settings.character_pricing());
    Ok(Arc::new(builder.build()?))
}
