//! Classified provider failures.

use crate::error_code::ErrorCode;
use std::time::Duration;
use thiserror::Error;

/// The fixed set of failures a provider may report.
///
/// Providers classify at their own boundary; anything they cannot place
/// (malformed output, schema violations, unexpected statuses) is a generic
/// [`ProviderError::Provider`].
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("{provider}: connection failed: {message}")]
    Connection { provider: String, message: String },

    #[error("{provider}: authentication failed: {message}")]
    Authentication { provider: String, message: String },

    #[error("{provider}: rate limited{}: {message}", format_retry_after(.retry_after))]
    RateLimit {
        provider: String,
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("{provider}: timed out: {message}")]
    Timeout { provider: String, message: String },

    #[error("{provider}: {message}")]
    Provider {
        provider: String,
        message: String,
        status: Option<u16>,
    },
}

fn format_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}s)", d.as_secs()),
        None => String::new(),
    }
}

impl ProviderError {
    pub fn connection(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn authentication(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limit(
        provider: impl Into<String>,
        message: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self::RateLimit {
            provider: provider.into(),
            message: message.into(),
            retry_after,
        }
    }

    pub fn timeout(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn other(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Classify a non-success HTTP response.
    pub fn from_status(
        provider: impl Into<String>,
        status: u16,
        body: &str,
        retry_after: Option<Duration>,
    ) -> Self {
        let provider = provider.into();
        let message = format!("HTTP {}: {}", status, truncate(body, 300));
        match ErrorCode::from_http_status(status) {
            ErrorCode::Authentication => Self::Authentication { provider, message },
            ErrorCode::RateLimited => Self::RateLimit {
                provider,
                message,
                retry_after,
            },
            ErrorCode::Timeout => Self::Timeout { provider, message },
            ErrorCode::Connection => Self::Connection { provider, message },
            _ => Self::Provider {
                provider,
                message,
                status: Some(status),
            },
        }
    }

    /// Classify a transport-level `reqwest` failure.
    pub fn from_reqwest(provider: impl Into<String>, err: &reqwest::Error) -> Self {
        let provider = provider.into();
        if err.is_timeout() {
            Self::timeout(provider, err.to_string())
        } else if err.is_connect() || err.is_request() {
            Self::connection(provider, err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(provider, status.as_u16(), &err.to_string(), None)
        } else {
            Self::other(provider, err.to_string())
        }
    }

    pub fn provider_name(&self) -> &str {
        match self {
            Self::Connection { provider, .. }
            | Self::Authentication { provider, .. }
            | Self::RateLimit { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Provider { provider, .. } => provider,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Connection { message, .. }
            | Self::Authentication { message, .. }
            | Self::RateLimit { message, .. }
            | Self::Timeout { message, .. }
            | Self::Provider { message, .. } => message,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Connection { .. } => ErrorCode::Connection,
            Self::Authentication { .. } => ErrorCode::Authentication,
            Self::RateLimit { .. } => ErrorCode::RateLimited,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Provider { .. } => ErrorCode::ProviderError,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push('…');
        out
    }
}
