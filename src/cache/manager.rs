//! Audio cache front with hit/miss accounting.

use super::backend::{CacheBackend, MemoryCache};
use super::key::AudioCacheKey;
use crate::types::AudioFormat;
use crate::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Written as `default_ttl_secs`; fractional seconds are kept.
    #[serde(rename = "default_ttl_secs", default = "default_ttl", with = "fractional_secs")]
    pub ttl: Duration,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Larger payloads are not cached.
    #[serde(default = "default_max_entry_size")]
    pub max_entry_size: usize,
    /// Entry-count cap for the in-memory backend; unbounded when absent.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

fn default_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

mod fractional_secs {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, s: S) -> Result<S::Ok, S::Error> {
        if ttl.subsec_nanos() == 0 {
            s.serialize_u64(ttl.as_secs())
        } else {
            s.serialize_f64(ttl.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_max_entry_size() -> usize {
    10 * 1024 * 1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            enabled: default_enabled(),
            max_entry_size: default_max_entry_size(),
            max_entries: None,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }
    pub fn default_ttl(&self) -> Duration {
        self.ttl
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub errors: u64,
    pub hit_rate: f64,
}

struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    fn to_stats(&self, size: usize) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            size,
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

/// Content-addressed TTL store for synthesized speech.
///
/// A miss is `None`, never an error. Backend failures are logged, counted
/// and treated as misses on read.
pub struct AudioCache {
    config: CacheConfig,
    backend: Box<dyn CacheBackend>,
    stats: AtomicStats,
}

impl AudioCache {
    pub fn new(config: CacheConfig, backend: Box<dyn CacheBackend>) -> Self {
        Self {
            config,
            backend,
            stats: AtomicStats::new(),
        }
    }

    /// In-memory cache honouring `config.max_entries`.
    pub fn in_memory(config: CacheConfig) -> Self {
        let backend = match config.max_entries {
            Some(max) => MemoryCache::with_max_entries(max),
            None => MemoryCache::new(),
        };
        Self::new(config, Box::new(backend))
    }

    pub fn cache_key(text: &str, language: &str, voice: &str, format: AudioFormat) -> AudioCacheKey {
        AudioCacheKey::new(text, language, voice, format)
    }

    pub async fn get(&self, key: &AudioCacheKey) -> Option<Bytes> {
        if !self.config.enabled {
            return None;
        }
        match self.backend.get(key).await {
            Ok(Some(data)) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, bytes = data.len(), "audio cache hit");
                Some(data)
            }
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "audio cache miss");
                None
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key = %key, backend = self.backend.name(), error = %e, "audio cache read failed");
                None
            }
        }
    }

    pub async fn set(&self, key: &AudioCacheKey, audio: Bytes) -> Result<()> {
        self.set_with_ttl(key, audio, self.config.default_ttl()).await
    }

    pub async fn set_with_ttl(&self, key: &AudioCacheKey, audio: Bytes, ttl: Duration) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        if audio.len() > self.config.max_entry_size {
            tracing::debug!(key = %key, bytes = audio.len(), "audio too large to cache");
            return Ok(());
        }
        match self.backend.set(key, audio, ttl).await {
            Ok(()) => {
                self.stats.sets.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    pub async fn delete(&self, key: &AudioCacheKey) -> Result<bool> {
        self.backend.delete(key).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await
    }

    /// Sweep expired entries; bounds memory between reads.
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let removed = self.backend.purge_expired().await?;
        if removed > 0 {
            tracing::info!(removed, backend = self.backend.name(), "expired audio entries removed");
        }
        Ok(removed)
    }

    pub async fn size(&self) -> usize {
        match self.backend.len().await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "audio cache size unavailable");
                0
            }
        }
    }

    pub async fn stats(&self) -> CacheStats {
        self.stats.to_stats(self.size().await)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}
