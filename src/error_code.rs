//! Stable error codes shared by provider, manager and quota errors.
//!
//! Every error surfaced by this crate maps onto one [`ErrorCode`], which
//! carries a canonical code string and a category. Provider-level codes
//! never stop the [`ProviderManager`](crate::manager::ProviderManager)
//! from trying the next candidate; quota and orchestration codes are
//! returned before any provider is called.
//!
//! | Prefix | Category    | Description                               |
//! |--------|-------------|-------------------------------------------|
//! | E1xxx  | client      | Bad options, credentials, configuration   |
//! | E2xxx  | rate        | Provider rate limits and user quotas      |
//! | E3xxx  | server      | Provider-side and transport failures      |
//! | E4xxx  | operational | Orchestration outcomes (disabled, no providers, exhausted) |
//! | E9xxx  | unknown     | Catch-all                                 |
//!
//! ```rust
//! use ai_gen_orchestrator::error_code::ErrorCode;
//!
//! let code = ErrorCode::from_http_status(429);
//! assert_eq!(code.code(), "E2001");
//! assert_eq!(code.category(), "rate");
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// E1001: Generation options out of range
    InvalidOptions,
    /// E1002: Invalid, expired, or missing API key
    Authentication,
    /// E1003: Invalid or incomplete configuration
    Configuration,
    /// E2001: Provider-side rate limit hit
    RateLimited,
    /// E2002: Per-user or per-request quota exceeded
    QuotaExceeded,
    /// E3001: Generic provider failure (bad status, malformed output, schema violation)
    ProviderError,
    /// E3002: Could not reach the provider
    Connection,
    /// E3003: Provider did not answer in time
    Timeout,
    /// E4001: Generation switched off by configuration
    GenerationDisabled,
    /// E4002: No registered provider is available
    NoProvidersAvailable,
    /// E4003: Every candidate provider failed
    AllProvidersFailed,
    /// E4004: Usage log or quota store failure
    Storage,
    /// E9999: Error could not be classified
    Unknown,
}

impl ErrorCode {
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidOptions => "E1001",
            Self::Authentication => "E1002",
            Self::Configuration => "E1003",
            Self::RateLimited => "E2001",
            Self::QuotaExceeded => "E2002",
            Self::ProviderError => "E3001",
            Self::Connection => "E3002",
            Self::Timeout => "E3003",
            Self::GenerationDisabled => "E4001",
            Self::NoProvidersAvailable => "E4002",
            Self::AllProvidersFailed => "E4003",
            Self::Storage => "E4004",
            Self::Unknown => "E9999",
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidOptions => "invalid_options",
            Self::Authentication => "authentication",
            Self::Configuration => "configuration",
            Self::RateLimited => "rate_limited",
            Self::QuotaExceeded => "quota_exceeded",
            Self::ProviderError => "provider_error",
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::GenerationDisabled => "generation_disabled",
            Self::NoProvidersAvailable => "no_providers_available",
            Self::AllProvidersFailed => "all_providers_failed",
            Self::Storage => "storage",
            Self::Unknown => "unknown",
        }
    }

    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidOptions | Self::Authentication | Self::Configuration => "client",
            Self::RateLimited | Self::QuotaExceeded => "rate",
            Self::ProviderError | Self::Connection | Self::Timeout => "server",
            Self::GenerationDisabled
            | Self::NoProvidersAvailable
            | Self::AllProvidersFailed
            | Self::Storage => "operational",
            Self::Unknown => "unknown",
        }
    }

    /// Maps an HTTP status returned by a provider to the closest code.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            408 | 504 => Self::Timeout,
            429 => Self::RateLimited,
            502 | 503 | 529 => Self::Connection,
            400..=599 => Self::ProviderError,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
