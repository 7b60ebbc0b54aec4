use crate::error_code::ErrorCode;
use crate::manager::ProviderFailure;
use crate::provider::{GenerationKind, ProviderError};
use crate::resilience::QuotaExceeded;
use thiserror::Error;

/// Structured error context for configuration and storage failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key or record field that caused the error (e.g., "providers.deepseek.base_url")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "usage_store")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the orchestration layer.
///
/// Provider failures are classified at the provider boundary
/// ([`ProviderError`]); the manager only surfaces them wrapped in
/// [`Error::AllProvidersFailed`] once every candidate is exhausted. Quota
/// breaches surface immediately as [`Error::RateLimitExceeded`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("All {kind} providers failed: {}", format_failures(.failures))]
    AllProvidersFailed {
        kind: GenerationKind,
        failures: Vec<ProviderFailure>,
    },

    #[error("No {kind} providers available")]
    NoProvidersAvailable { kind: GenerationKind },

    #[error("AI {kind} generation is disabled")]
    GenerationDisabled { kind: GenerationKind },

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(#[from] QuotaExceeded),

    #[error("Invalid generation options: {field}: {message}")]
    InvalidOptions {
        field: &'static str,
        message: String,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}{}", format_context(.context))]
    Storage {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn format_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[{}] {}", f.provider_id, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn storage_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Storage {
            message: msg.into(),
            context,
        }
    }

    pub(crate) fn invalid_option(field: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidOptions {
            field,
            message: message.into(),
        }
    }

    /// Stable code for logs and API responses.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Provider(e) => e.code(),
            Error::AllProvidersFailed { .. } => ErrorCode::AllProvidersFailed,
            Error::NoProvidersAvailable { .. } => ErrorCode::NoProvidersAvailable,
            Error::GenerationDisabled { .. } => ErrorCode::GenerationDisabled,
            Error::RateLimitExceeded(_) => ErrorCode::QuotaExceeded,
            Error::InvalidOptions { .. } => ErrorCode::InvalidOptions,
            Error::Configuration { .. } | Error::Yaml(_) => ErrorCode::Configuration,
            Error::Storage { .. } | Error::Io(_) => ErrorCode::Storage,
            Error::Serialization(_) => ErrorCode::Unknown,
        }
    }

    /// Ordered `(provider, error)` attempts of an aggregate failure.
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            Error::AllProvidersFailed { failures, .. } => failures,
            _ => &[],
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Storage { context, .. } => Some(context),
            _ => None,
        }
    }
}
