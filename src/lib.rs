//! # ai-gen-orchestrator
//!
//! Resource orchestration for AI text and speech generation.
//!
//! ## Overview
//!
//! This library sits between an application and interchangeable
//! third-party generation backends. It decides which provider serves a
//! call, enforces per-user and per-call usage ceilings, avoids repeated
//! paid speech synthesis through content-addressed caching, and records
//! every attempt for cost and reliability accounting. Prompt content is
//! opaque to it.
//!
//! ## Key Features
//!
//! - **Fallback**: [`manager::ProviderManager`] tries providers strictly in
//!   priority order and returns the first success
//! - **Quotas**: [`resilience::RateLimiter`] enforces a per-request ceiling
//!   and a per-user daily ceiling that resets at UTC midnight
//! - **Audio cache**: [`cache::AudioCache`] keys synthesized speech by a
//!   SHA-256 of the normalized text, language, voice and format
//! - **Accounting**: [`usage::UsageTracker`] writes one row per attempt and
//!   aggregates cost by provider, activity, user and day
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_gen_orchestrator::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> ai_gen_orchestrator::Result<()> {
//!     let config = OrchestratorConfig::load("genorch.yaml")?;
//!     let service = GenerationService::from_config(&config)?;
//!
//!     let result = service
//!         .generate(&TextRequest::new("student-42", "Write three quiz questions about photosynthesis").activity("quiz"))
//!         .await?;
//!     println!("{} ({} tokens)", result.content, result.usage.total_tokens());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`provider`] | Provider capability traits and classified errors |
//! | [`manager`] | Priority-ordered fallback across providers |
//! | [`resilience`] | Per-request and daily quota enforcement |
//! | [`cache`] | TTL audio cache with pluggable backends |
//! | [`usage`] | Usage rows and cost aggregation |
//! | [`facade`] | Request-level service wiring everything together |
//! | [`config`] | YAML configuration with environment overrides |
//! | [`tokens`] | Token estimation and pricing |
//! | [`types`] | Options and result value types |

pub mod cache;
pub mod config;
pub mod error_code;
pub mod facade;
pub mod manager;
pub mod provider;
pub mod resilience;
pub mod tokens;
pub mod types;
pub mod usage;

#[cfg(feature = "http-providers")]
pub mod providers;

pub use config::OrchestratorConfig;
pub use facade::{prelude, GenerationService, SpeechRequest, TextRequest};
pub use manager::{Fallback, SpeechManager, TextManager};
pub use provider::{GenerationKind, ProviderError, ProviderId};
pub use types::{GenerationOptions, GenerationResult, SpeechOptions, SpeechResult};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
pub use error_code::ErrorCode;
