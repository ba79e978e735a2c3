use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use markethub::features::{
    cache::TtlCache,
    rate_limiter::{InMemoryRateLimitState, RateLimitState},
};

fn benchmark_rate_limiter(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let _guard = rt.enter();

    let mut group = c.benchmark_group("rate_limiter");
    for keys in [1usize, 1_000, 100_000] {
        let limiter = InMemoryRateLimitState::new();
        let key_names: Vec<String> = (0..keys).map(|i| format!("api:10.0.{}.{}", i / 256, i % 256)).collect();
        let mut next = 0usize;

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("check_rate_limit", keys), &keys, |b, _| {
            b.iter(|| {
                let key = &key_names[next % key_names.len()];
                next = next.wrapping_add(1);
                black_box(limiter.check_rate_limit(key, 1_000_000, Duration::from_secs(60)))
            })
        });
    }
    group.finish();
}

fn benchmark_cache(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let _guard = rt.enter();

    let cache: TtlCache<String> = TtlCache::new("bench", Duration::from_secs(300));
    for i in 0..10_000 {
        cache.set(format!("organization:{i}"), format!("org-{i}"));
    }

    let mut group = c.benchmark_group("ttl_cache");
    group.throughput(Throughput::Elements(1));
    group.bench_function("get_hit", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % 10_000;
            black_box(cache.get(&format!("organization:{i}")))
        })
    });
    group.bench_function("get_miss", |b| b.iter(|| black_box(cache.get("organization:missing"))));
    group.bench_function("get_or_set_hit", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                cache
                    .get_or_set("organization:42", || async { Ok::<_, ()>("loaded".to_string()) })
                    .await,
            )
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_rate_limiter, benchmark_cache);
criterion_main!(benches);
