//! Content-addressed TTL cache for synthesized speech.
//!
//! Paid speech calls are de-duplicated by hashing the normalized text with
//! the language, voice and format. Identical inputs always address the same
//! slot, so repeated requests across users reuse one synthesis.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`AudioCache`] | Front with default TTL, hit/miss statistics |
//! | [`CacheConfig`] | TTL, size limits, enable switch |
//! | [`CacheBackend`] | Trait for pluggable stores |
//! | [`MemoryCache`] | Single-mutex in-process store |
//! | [`NullCache`] | No-op store for disabling caching |
//! | [`AudioCacheKey`] | SHA-256 content key |
//!
//! Expiry is lazy: an expired entry disappears on its next read. Memory is
//! bounded only by [`AudioCache::cleanup_expired`] sweeps, or by an explicit
//! `max_entries` cap.
//!
//! ```rust
//! use ai_gen_orchestrator::cache::{AudioCache, CacheConfig};
//! use ai_gen_orchestrator::types::AudioFormat;
//! use bytes::Bytes;
//!
//! # async fn demo() -> ai_gen_orchestrator::Result<()> {
//! let cache = AudioCache::in_memory(CacheConfig::new());
//! let key = AudioCache::cache_key("Hello", "en", "jenny", AudioFormat::Mp3);
//! if cache.get(&key).await.is_none() {
//!     cache.set(&key, Bytes::from_static(b"...")).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, MemoryCache, NullCache};
pub use key::{normalize_text, AudioCacheKey};
pub use manager::{AudioCache, CacheConfig, CacheStats};
