//! Persistence seam for usage rows.

use super::record::{UsageFilter, UsageRecord};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Append-only usage log plus per-user monthly generation counters.
///
/// `append` is one unit of work: the row and, when `count_generation` is
/// set, the increment of the row's user/month counter land together or not
/// at all.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn append(&self, record: UsageRecord, count_generation: bool) -> Result<()>;

    async fn records(&self, filter: &UsageFilter) -> Result<Vec<UsageRecord>>;

    /// Generations counted for `user_id` in `month` (`YYYY-MM`).
    async fn monthly_generations(&self, user_id: &str, month: &str) -> Result<u32>;

    fn name(&self) -> &'static str;
}

#[derive(Default)]
struct Ledger {
    records: Vec<UsageRecord>,
    monthly: HashMap<(String, String), u32>,
}

/// Log and counters under one mutex.
#[derive(Default)]
pub struct InMemoryUsageStore {
    ledger: Mutex<Ledger>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>> {
        self.ledger.lock().map_err(|_| {
            Error::storage_with_context(
                "usage ledger poisoned",
                ErrorContext::new().with_source("usage_store"),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.lock().map(|l| l.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn append(&self, record: UsageRecord, count_generation: bool) -> Result<()> {
        let mut ledger = self.lock()?;
        if count_generation {
            if let Some(ref user) = record.user_id {
                let slot = ledger
                    .monthly
                    .entry((user.clone(), record.month()))
                    .or_insert(0);
                *slot = slot.saturating_add(1);
            }
        }
        ledger.records.push(record);
        Ok(())
    }

    async fn records(&self, filter: &UsageFilter) -> Result<Vec<UsageRecord>> {
        Ok(self
            .lock()?
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn monthly_generations(&self, user_id: &str, month: &str) -> Result<u32> {
        Ok(self
            .lock()?
            .monthly
            .get(&(user_id.to_string(), month.to_string()))
            .copied()
            .unwrap_or(0))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
