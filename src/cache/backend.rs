//! Cache backend implementations.

use super::key::AudioCacheKey;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Clone)]
struct CacheEntry {
    data: Bytes,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: Bytes, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(u64::from(u32::MAX)));
        Self { data, expires_at }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Present and unexpired bytes. Expired entries may be removed here.
    async fn get(&self, key: &AudioCacheKey) -> Result<Option<Bytes>>;
    /// Unconditional overwrite.
    async fn set(&self, key: &AudioCacheKey, value: Bytes, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &AudioCacheKey) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
    /// Number of unexpired entries.
    async fn len(&self) -> Result<usize>;
    /// Physically remove expired entries. Returns how many were removed.
    async fn purge_expired(&self) -> Result<usize>;
    fn name(&self) -> &'static str;
}

/// In-process store behind a single coarse mutex.
///
/// Unbounded unless [`with_max_entries`](Self::with_max_entries) is used;
/// between sweeps, expired entries still occupy memory until read.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_entries: Option<usize>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: None,
        }
    }

    /// Cap the entry count. At capacity, expired entries go first, then the
    /// entry closest to expiry.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: Some(max_entries.max(1)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CacheEntry>>> {
        self.entries.lock().map_err(|_| {
            Error::storage_with_context(
                "audio cache poisoned",
                ErrorContext::new().with_source("memory_cache"),
            )
        })
    }

    fn make_room(&self, entries: &mut HashMap<String, CacheEntry>, incoming: &str) {
        let Some(max) = self.max_entries else {
            return;
        };
        if entries.contains_key(incoming) || entries.len() < max {
            return;
        }
        let now = Instant::now();
        entries.retain(|_, e| !e.is_expired(now));
        while entries.len() >= max {
            let soonest = entries
                .iter()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone());
            match soonest {
                Some(k) => {
                    entries.remove(&k);
                }
                None => break,
            }
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &AudioCacheKey) -> Result<Option<Bytes>> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        match entries.get(key.as_str()) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key.as_str());
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.data.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &AudioCacheKey, value: Bytes, ttl: Duration) -> Result<()> {
        let mut entries = self.lock()?;
        self.make_room(&mut entries, key.as_str());
        entries.insert(key.as_str().to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &AudioCacheKey) -> Result<bool> {
        Ok(self.lock()?.remove(key.as_str()).is_some())
    }

    async fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let now = Instant::now();
        Ok(self
            .lock()?
            .values()
            .filter(|e| !e.is_expired(now))
            .count())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        Ok(before - entries.len())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Backend that stores nothing; every read misses.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn get(&self, _: &AudioCacheKey) -> Result<Option<Bytes>> {
        Ok(None)
    }
    async fn set(&self, _: &AudioCacheKey, _: Bytes, _: Duration) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _: &AudioCacheKey) -> Result<bool> {
        Ok(false)
    }
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        Ok(0)
    }
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}
