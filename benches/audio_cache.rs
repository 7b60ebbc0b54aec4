//! Benchmarks for the audio cache hot path
//!
//! This benchmark measures:
//! - Content key hashing for short and long texts
//! - Hit and miss latency against the in-memory backend
//! - Write throughput with and without an entry cap

use ai_gen_orchestrator::cache::{AudioCache, CacheConfig};
use ai_gen_orchestrator::types::AudioFormat;
use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const SENTENCE: &str = "The mitochondria is the powerhouse of the cell.";

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn bench_key_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_key");
    for repeat in [1usize, 20, 200] {
        let text = SENTENCE.repeat(repeat);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(text.len()), &text, |b, text| {
            b.iter(|| AudioCache::cache_key(black_box(text), "en", "jenny", AudioFormat::Mp3))
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let rt = runtime();
    let cache = AudioCache::in_memory(CacheConfig::new());
    let audio = Bytes::from(vec![0u8; 32 * 1024]);
    let keys: Vec<_> = (0..1_000)
        .map(|i| AudioCache::cache_key(&format!("{SENTENCE} {i}"), "en", "jenny", AudioFormat::Mp3))
        .collect();
    rt.block_on(async {
        for key in &keys {
            let _ = cache.set(key, audio.clone()).await;
        }
    });
    let absent = AudioCache::cache_key("never stored", "en", "jenny", AudioFormat::Mp3);

    let mut group = c.benchmark_group("cache_lookup");
    group.bench_function("hit", |b| {
        b.iter(|| rt.block_on(cache.get(black_box(&keys[500]))))
    });
    group.bench_function("miss", |b| {
        b.iter(|| rt.block_on(cache.get(black_box(&absent))))
    });
    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let rt = runtime();
    let audio = Bytes::from(vec![0u8; 4 * 1024]);
    let mut group = c.benchmark_group("cache_insert");
    group.throughput(Throughput::Elements(1));

    for (label, config) in [
        ("unbounded", CacheConfig::new()),
        ("capped_256", CacheConfig::new().with_max_entries(256)),
    ] {
        let cache = AudioCache::in_memory(config);
        let mut n = 0u64;
        group.bench_function(label, |b| {
            b.iter(|| {
                n += 1;
                let key = AudioCache::cache_key(&n.to_string(), "en", "jenny", AudioFormat::Mp3);
                rt.block_on(cache.set(&key, audio.clone()))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_key_hashing, bench_lookup, bench_insert);
criterion_main!(benches);
