//! `/audio/speech` synthesis provider.

use super::{error_from_response, http_client, DEFAULT_TIMEOUT};
use crate::provider::{Provider, ProviderError, SpeechProvider};
use crate::tokens::CharacterPricing;
use crate::types::{SpeechOptions, SpeechResult};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "tts-1";
const DEFAULT_VOICE: &str = "alloy";

pub struct OpenAiSpeechProvider {
    name: String,
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    default_voice: String,
    pricing: CharacterPricing,
}

impl OpenAiSpeechProvider {
    pub fn builder(name: impl Into<String>) -> OpenAiSpeechProviderBuilder {
        OpenAiSpeechProviderBuilder::new(name)
    }

    fn voice_for<'a>(&'a self, options: &'a SpeechOptions) -> &'a str {
        if options.voice.trim().is_empty() {
            &self.default_voice
        } else {
            &options.voice
        }
    }
}

impl Provider for OpenAiSpeechProvider {
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
impl SpeechProvider for OpenAiSpeechProvider {
    async fn synthesize(
        &self,
        text: &str,
        options: &SpeechOptions,
    ) -> std::result::Result<SpeechResult, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::authentication(&self.name, "no API key configured"))?;
        let voice = self.voice_for(options).to_string();
        let mut body = json!({
            "model": self.model,
            "input": text,
            "voice": voice,
            "response_format": options.format.as_str(),
        });
        if let Some(speed) = options.speed {
            body["speed"] = json!(speed);
        }

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&self.name, &e))?;

        if !response.status().is_success() {
            return Err(error_from_response(&self.name, response).await);
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(&self.name, &e))?;
        if audio.is_empty() {
            return Err(ProviderError::other(&self.name, "empty audio response"));
        }

        let characters = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        let latency_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            provider = %self.name,
            voice = %voice,
            characters,
            bytes = audio.len(),
            latency_ms,
            "speech synthesized"
        );

        Ok(SpeechResult {
            audio,
            format: options.format,
            provider: self.name.clone(),
            model: self.model.clone(),
            voice,
            characters,
            estimated_cost_usd: self.pricing.calculate_cost(characters),
            latency_ms,
        })
    }
}

pub struct OpenAiSpeechProviderBuilder {
    name: String,
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    default_voice: Option<String>,
    timeout: Duration,
    pricing: Option<CharacterPricing>,
}

impl OpenAiSpeechProviderBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: None,
            api_key: None,
            model: None,
            default_voice: None,
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

    /// Used when a request leaves the voice empty.
    pub fn default_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = Some(voice.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pricing(mut self, pricing: CharacterPricing) -> Self {
        self.pricing = Some(pricing);
        self
    }

    pub fn build(self) -> Result<OpenAiSpeechProvider> {
        if self.name.trim().is_empty() {
            return Err(Error::configuration("provider name must not be empty"));
        }
        Ok(OpenAiSpeechProvider {
            client: http_client(&self.name, self.timeout)?,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: self.api_key.filter(|k| !k.is_empty()),
            name: self.name,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            default_voice: self.default_voice.unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            pricing: self.pricing.unwrap_or_else(CharacterPricing::openai_tts),
        })
    }
}
