//! Provider capability interface.
//!
//! A provider is one interchangeable backend. Every backend implements the
//! base [`Provider`] trait plus exactly one capability trait:
//!
//! | Trait | Capability |
//! |-------|------------|
//! | [`TextProvider`] | `generate`, `generate_structured`, `generate_batch` |
//! | [`SpeechProvider`] | `synthesize` |
//!
//! Providers report failures only through the classified [`ProviderError`]
//! set. Malformed output is a generic [`ProviderError::Provider`], which the
//! manager treats like any other failure.

mod error;
pub mod schema;

pub use error::ProviderError;

use crate::types::{
    GenerationOptions, GenerationResult, ResponseFormat, SpeechOptions, SpeechResult,
    StructuredResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of generation a provider or manager handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Text,
    Speech,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Speech => "speech",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit provider-kind key (e.g. `deepseek`, `gemini`, `azure`).
///
/// Registration and de-duplication compare these keys, never object
/// identity. Keys are trimmed and lower-cased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProviderId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<ProviderId> for String {
    fn from(id: ProviderId) -> Self {
        id.0
    }
}

/// Identity and availability shared by every backend.
pub trait Provider: Send + Sync {
    /// Human-readable provider name used in logs and usage rows.
    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    /// True iff the credentials/configuration this provider needs are present.
    ///
    /// Must be a cheap local check; never performs network I/O.
    fn is_available(&self) -> bool;
}

#[async_trait]
pub trait TextProvider: Provider {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResult, ProviderError>;

    /// Generate JSON conforming to `schema`.
    ///
    /// The default forces [`ResponseFormat::Json`], parses the content and
    /// validates it; parse and schema failures are generic provider errors.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        options: &GenerationOptions,
    ) -> Result<StructuredResult, ProviderError> {
        let json_options = options.with_response_format(ResponseFormat::Json);
        let result = self.generate(prompt, &json_options).await?;
        let value = schema::parse_and_validate(self.name(), &result.content, schema)?;
        Ok(StructuredResult { value, result })
    }

    /// Generate one result per prompt, all or nothing.
    async fn generate_batch(
        &self,
        prompts: &[String],
        options: &GenerationOptions,
    ) -> Result<Vec<GenerationResult>, ProviderError> {
        let mut results = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            results.push(self.generate(prompt, options).await?);
        }
        Ok(results)
    }
}

#[async_trait]
pub trait SpeechProvider: Provider {
    async fn synthesize(
        &self,
        text: &str,
        options: &SpeechOptions,
    ) -> Result<SpeechResult, ProviderError>;
}
