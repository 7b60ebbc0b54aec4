//! Audio cache expiry, normalization and concurrency.

use ai_gen_orchestrator::cache::{AudioCache, CacheConfig};
use ai_gen_orchestrator::types::AudioFormat;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_ttl_expiry_counts_exactly_one_extra_miss() {
    let cache = AudioCache::in_memory(CacheConfig::new());
    let key = AudioCache::cache_key("Photosynthesis", "en", "jenny", AudioFormat::Mp3);

    cache
        .set_with_ttl(&key, Bytes::from_static(b"audio"), Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(cache.get(&key).await, Some(Bytes::from_static(b"audio")));
    let before = cache.stats().await;

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(cache.get(&key).await.is_none());
    let after = cache.stats().await;
    assert_eq!(after.misses, before.misses + 1);
    assert_eq!(after.hits, before.hits);
    assert_eq!(after.size, 0);
}

#[tokio::test]
async fn test_key_normalization_is_deterministic() {
    let a = AudioCache::cache_key("  Hello World ", "en", "jenny", AudioFormat::Mp3);
    let b = AudioCache::cache_key("hello world", "en", "jenny", AudioFormat::Mp3);
    let c = AudioCache::cache_key("hello world", "en", "jenny", AudioFormat::Opus);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let cache = AudioCache::in_memory(CacheConfig::new());
    cache.set(&a, Bytes::from_static(b"x")).await.unwrap();
    assert!(cache.get(&b).await.is_some());
    assert!(cache.get(&c).await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_unique_writes_are_all_visible() {
    const TASKS: usize = 8;
    const PER_TASK: usize = 100;

    let cache = Arc::new(AudioCache::in_memory(CacheConfig::new()));
    let mut handles = Vec::new();
    for t in 0..TASKS {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..PER_TASK {
                let text = format!("task {t} sentence {i}");
                let key = AudioCache::cache_key(&text, "en", "jenny", AudioFormat::Mp3);
                cache.set(&key, Bytes::from(text.clone().into_bytes())).await.unwrap();
                let read = cache.get(&key).await.unwrap();
                assert_eq!(read, Bytes::from(text.into_bytes()));
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let stats = cache.stats().await;
    assert_eq!(stats.size, TASKS * PER_TASK);
    assert_eq!(stats.hits, (TASKS * PER_TASK) as u64);
    assert_eq!(stats.sets, (TASKS * PER_TASK) as u64);
    assert_eq!(stats.misses, 0);
}

#[tokio::test]
async fn test_cleanup_expired_reclaims_memory() {
    let cache = AudioCache::in_memory(CacheConfig::new());
    for i in 0..10 {
        let key = AudioCache::cache_key(&format!("s{i}"), "en", "v", AudioFormat::Mp3);
        cache
            .set_with_ttl(&key, Bytes::from_static(b"a"), Duration::from_millis(20))
            .await
            .unwrap();
    }
    let keep = AudioCache::cache_key("keep", "en", "v", AudioFormat::Mp3);
    cache.set(&keep, Bytes::from_static(b"k")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(cache.cleanup_expired().await.unwrap(), 10);
    assert_eq!(cache.size().await, 1);
}

#[tokio::test]
async fn test_bounded_cache_respects_max_entries() {
    let cache = AudioCache::in_memory(CacheConfig::new().with_max_entries(5));
    for i in 0..20 {
        let key = AudioCache::cache_key(&format!("s{i}"), "en", "v", AudioFormat::Mp3);
        cache.set(&key, Bytes::from_static(b"a")).await.unwrap();
    }
    assert_eq!(cache.size().await, 5);
}
