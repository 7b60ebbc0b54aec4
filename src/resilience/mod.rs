//! Per-user quota enforcement.
//!
//! The [`RateLimiter`](rate_limiter::RateLimiter) keeps a
//! `{user_id -> {UTC date -> count}}` ledger and enforces two ceilings:
//!
//! - a static per-request item ceiling, independent of the user;
//! - a per-user daily ceiling, resetting at UTC midnight.
//!
//! Quota breaches surface as [`QuotaExceeded`] immediately; there is no
//! fallback for them.
//!
//! ```rust
//! use ai_gen_orchestrator::resilience::{RateLimiter, RateLimiterConfig};
//!
//! # async fn demo() -> ai_gen_orchestrator::Result<()> {
//! let limiter = RateLimiter::new(
//!     RateLimiterConfig::new()
//!         .with_per_request_limit(20)
//!         .with_daily_limit(100),
//! );
//!
//! limiter.check_limits("user-42", 5).await?;
//! // ... provider call succeeded ...
//! limiter.record_usage("user-42", 5).await?;
//! # Ok(())
//! # }
//! ```

pub mod rate_limiter;
pub mod store;

pub use rate_limiter::{LimitKind, QuotaExceeded, QuotaInfo, RateLimiter, RateLimiterConfig};
pub use store::{InMemoryQuotaStore, QuotaStore};
