//! Storage for per-user daily usage counters.

use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Backing store for the `{user_id -> {date -> count}}` ledger.
///
/// The in-memory implementation covers single-node deployments; a shared
/// store (Redis, SQL) implements the same trait for multi-node use.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Count recorded for `user_id` on `day`, zero when absent.
    async fn usage(&self, user_id: &str, day: NaiveDate) -> Result<u32>;

    /// Add `count` to the bucket, creating it lazily. Returns the new total.
    async fn increment(&self, user_id: &str, day: NaiveDate, count: u32) -> Result<u32>;

    /// Drop every bucket dated before `cutoff`. Returns how many were removed.
    async fn purge_before(&self, cutoff: NaiveDate) -> Result<usize>;

    fn name(&self) -> &'static str;
}

/// Single-process ledger behind one coarse mutex.
///
/// Every operation is a short map read/write; the lock is never held
/// across an await point.
#[derive(Default)]
pub struct InMemoryQuotaStore {
    buckets: Mutex<HashMap<String, BTreeMap<NaiveDate, u32>>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, BTreeMap<NaiveDate, u32>>>> {
        self.buckets.lock().map_err(|_| {
            Error::storage_with_context(
                "quota ledger poisoned",
                ErrorContext::new().with_source("quota_store"),
            )
        })
    }

    /// Number of `(user, day)` buckets currently held.
    pub fn bucket_count(&self) -> usize {
        self.lock()
            .map(|b| b.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn usage(&self, user_id: &str, day: NaiveDate) -> Result<u32> {
        let buckets = self.lock()?;
        Ok(buckets
            .get(user_id)
            .and_then(|days| days.get(&day))
            .copied()
            .unwrap_or(0))
    }

    async fn increment(&self, user_id: &str, day: NaiveDate, count: u32) -> Result<u32> {
        let mut buckets = self.lock()?;
        let slot = buckets
            .entry(user_id.to_string())
            .or_default()
            .entry(day)
            .or_insert(0);
        *slot = slot.saturating_add(count);
        Ok(*slot)
    }

    async fn purge_before(&self, cutoff: NaiveDate) -> Result<usize> {
        let mut buckets = self.lock()?;
        let mut removed = 0;
        buckets.retain(|_, days| {
            let before = days.len();
            days.retain(|day, _| *day >= cutoff);
            removed += before - days.len();
            !days.is_empty()
        });
        Ok(removed)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_increment_creates_lazily() {
        let store = InMemoryQuotaStore::new();
        assert_eq!(store.usage("u1", day(1)).await.unwrap(), 0);
        assert_eq!(store.bucket_count(), 0);
        assert_eq!(store.increment("u1", day(1), 3).await.unwrap(), 3);
        assert_eq!(store.increment("u1", day(1), 2).await.unwrap(), 5);
        assert_eq!(store.usage("u1", day(2)).await.unwrap(), 0);
        assert_eq!(store.bucket_count(), 1);
    }

    #[tokio::test]
    async fn test_purge_before_cutoff() {
        let store = InMemoryQuotaStore::new();
        store.increment("u1", day(1), 1).await.unwrap();
        store.increment("u1", day(5), 1).await.unwrap();
        store.increment("u2", day(2), 1).await.unwrap();

        assert_eq!(store.purge_before(day(5)).await.unwrap(), 2);
        assert_eq!(store.bucket_count(), 1);
        assert_eq!(store.usage("u1", day(5)).await.unwrap(), 1);
    }
}
