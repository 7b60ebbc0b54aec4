use super::store::{InMemoryQuotaStore, QuotaStore};
use crate::Result;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Maximum items a single call may request, independent of the user.
    #[serde(default = "default_per_request_limit")]
    pub per_request_limit: u32,
    /// Items a user may generate per UTC calendar day.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// Per-user daily ceilings that replace `daily_limit`.
    #[serde(default)]
    pub user_overrides: HashMap<String, u32>,
}

fn default_per_request_limit() -> u32 {
    20
}

fn default_daily_limit() -> u32 {
    100
}

impl RateLimiterConfig {
    pub fn new() -> Self {
        Self {
            per_request_limit: default_per_request_limit(),
            daily_limit: default_daily_limit(),
            user_overrides: HashMap::new(),
        }
    }

    pub fn with_per_request_limit(mut self, limit: u32) -> Self {
        self.per_request_limit = limit;
        self
    }

    pub fn with_daily_limit(mut self, limit: u32) -> Self {
        self.daily_limit = limit;
        self
    }

    pub fn with_user_limit(mut self, user_id: impl Into<String>, limit: u32) -> Self {
        self.user_overrides.insert(user_id.into(), limit);
        self
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    PerRequest,
    Daily,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerRequest => f.write_str("per-request"),
            Self::Daily => f.write_str("daily"),
        }
    }
}

/// A quota breach. Never triggers provider fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error(
    "{limit_kind} limit of {limit} exceeded ({current_usage} used, {requested} requested){}",
    format_reset(.resets_at)
)]
pub struct QuotaExceeded {
    pub limit_kind: LimitKind,
    pub current_usage: u32,
    pub limit: u32,
    pub requested: u32,
    /// Next UTC midnight for daily breaches.
    pub resets_at: Option<DateTime<Utc>>,
}

fn format_reset(resets_at: &Option<DateTime<Utc>>) -> String {
    match resets_at {
        Some(t) => format!(", resets at {}", t.to_rfc3339()),
        None => String::new(),
    }
}

/// Point-in-time view of a user's quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaInfo {
    pub user_id: String,
    pub date: NaiveDate,
    pub used_today: u32,
    pub daily_limit: u32,
    pub remaining: u32,
    pub per_request_limit: u32,
    pub resets_at: DateTime<Utc>,
}

/// Per-user daily quota ledger.
///
/// Call order per request: [`check_limits`](Self::check_limits) before the
/// provider call, [`record_usage`](Self::record_usage) only after it
/// succeeded, so failed calls are never charged. Checks and records are not
/// one atomic step; concurrent requests for the same user may briefly
/// over-admit.
pub struct RateLimiter {
    cfg: RateLimiterConfig,
    store: Arc<dyn QuotaStore>,
}

impl RateLimiter {
    pub fn new(cfg: RateLimiterConfig) -> Self {
        Self::with_store(cfg, Arc::new(InMemoryQuotaStore::new()))
    }

    pub fn with_store(cfg: RateLimiterConfig, store: Arc<dyn QuotaStore>) -> Self {
        tracing::debug!(
            store = store.name(),
            per_request_limit = cfg.per_request_limit,
            daily_limit = cfg.daily_limit,
            "rate limiter initialised"
        );
        Self { cfg, store }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.cfg
    }

    pub fn daily_limit_for(&self, user_id: &str) -> u32 {
        self.cfg
            .user_overrides
            .get(user_id)
            .copied()
            .unwrap_or(self.cfg.daily_limit)
    }

    pub fn check_per_request_limit(&self, count: u32) -> Result<()> {
        if count > self.cfg.per_request_limit {
            tracing::info!(
                requested = count,
                limit = self.cfg.per_request_limit,
                "per-request limit exceeded"
            );
            return Err(QuotaExceeded {
                limit_kind: LimitKind::PerRequest,
                current_usage: 0,
                limit: self.cfg.per_request_limit,
                requested: count,
                resets_at: None,
            }
            .into());
        }
        Ok(())
    }

    pub async fn check_daily_limit(&self, user_id: &str, count: u32) -> Result<()> {
        let now = Utc::now();
        let used = self.store.usage(user_id, now.date_naive()).await?;
        let limit = self.daily_limit_for(user_id);
        if used.saturating_add(count) > limit {
            tracing::info!(user_id, used, requested = count, limit, "daily limit exceeded");
            return Err(QuotaExceeded {
                limit_kind: LimitKind::Daily,
                current_usage: used,
                limit,
                requested: count,
                resets_at: Some(next_utc_midnight(now)),
            }
            .into());
        }
        Ok(())
    }

    /// Per-request ceiling first, then the user's daily ceiling.
    pub async fn check_limits(&self, user_id: &str, count: u32) -> Result<()> {
        self.check_per_request_limit(count)?;
        self.check_daily_limit(user_id, count).await
    }

    /// Charge `count` items to today's bucket. Returns today's new total.
    pub async fn record_usage(&self, user_id: &str, count: u32) -> Result<u32> {
        let total = self
            .store
            .increment(user_id, Utc::now().date_naive(), count)
            .await?;
        tracing::debug!(user_id, count, total, "usage recorded");
        Ok(total)
    }

    pub async fn get_usage(&self, user_id: &str) -> Result<u32> {
        self.store.usage(user_id, Utc::now().date_naive()).await
    }

    pub async fn get_remaining(&self, user_id: &str) -> Result<u32> {
        let used = self.get_usage(user_id).await?;
        Ok(self.daily_limit_for(user_id).saturating_sub(used))
    }

    pub async fn get_quota_info(&self, user_id: &str) -> Result<QuotaInfo> {
        let now = Utc::now();
        let date = now.date_naive();
        let used_today = self.store.usage(user_id, date).await?;
        let daily_limit = self.daily_limit_for(user_id);
        Ok(QuotaInfo {
            user_id: user_id.to_string(),
            date,
            used_today,
            daily_limit,
            remaining: daily_limit.saturating_sub(used_today),
            per_request_limit: self.cfg.per_request_limit,
            resets_at: next_utc_midnight(now),
        })
    }

    /// Drop buckets older than `days_to_keep` days before today.
    ///
    /// This is the only eviction path; schedule it periodically.
    pub async fn cleanup_old_data(&self, days_to_keep: u32) -> Result<usize> {
        let today = Utc::now().date_naive();
        let cutoff = today
            .checked_sub_days(Days::new(u64::from(days_to_keep)))
            .unwrap_or(NaiveDate::MIN);
        let removed = self.store.purge_before(cutoff).await?;
        tracing::info!(days_to_keep, %cutoff, removed, "quota buckets cleaned up");
        Ok(removed)
    }
}

pub fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive().succ_opt().unwrap_or(NaiveDate::MAX);
    Utc.from_utc_datetime(&tomorrow.and_time(NaiveTime::default()))
}
