//! Minimal prelude for application code.
//!
//! Goal: reduce import noise without hiding important concepts.

pub use crate::cache::{AudioCache, CacheConfig};
pub use crate::config::OrchestratorConfig;
pub use crate::facade::{BatchRequest, GenerationService, SpeechRequest, TextRequest};
pub use crate::manager::{Fallback, SpeechManager, TextManager};
pub use crate::provider::{GenerationKind, Provider, ProviderError, ProviderId, SpeechProvider, TextProvider};
pub use crate::resilience::{RateLimiter, RateLimiterConfig};
pub use crate::types::{AudioFormat, GenerationOptions, GenerationResult, SpeechOptions, SpeechResult};
pub use crate::usage::{UsageContext, UsageTracker};
pub use crate::{Error, Result};
