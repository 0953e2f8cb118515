use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lrucache::{StringCache, U64Cache};

fn bench_cached_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_get");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_u64_hit", |b| {
        let mut cache = U64Cache::new(1000).unwrap();
        let data = vec![b'x'; 1024];

        for id in 0..100u64 {
            cache.set(id, data.clone());
        }

        let mut counter = 0u64;
        b.iter(|| {
            black_box(cache.get(&(counter % 100)));
            counter += 1;
        });
    });

    group.bench_function("get_string_hit", |b| {
        let mut cache = StringCache::new(1000).unwrap();
        let keys: Vec<String> = (0..100).map(|i| format!("key:{}", i)).collect();

        for key in &keys {
            cache.set(key.clone(), key.len());
        }

        let mut counter = 0;
        b.iter(|| {
            black_box(cache.get(keys[counter % 100].as_str()));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_mixed_50_50(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("50_read_50_write", |b| {
        let mut cache = U64Cache::new(1000).unwrap();

        for id in 0..1000u64 {
            cache.set(id, id);
        }

        let mut counter = 0u64;
        b.iter(|| {
            if counter % 2 == 0 {
                black_box(cache.get(&(counter % 1000)));
            } else {
                cache.set(counter % 1500, counter);
            }
            counter += 1;
        });
    });

    group.finish();
}

fn bench_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_always_evicts", |b| {
        let mut cache = U64Cache::with_on_evict(10, |k, v: u64| {
            black_box((k, v));
        })
        .unwrap();

        let mut counter = 0u64;
        b.iter(|| {
            // Every key is new, so each set pushes out the tail
            cache.set(counter, counter);
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cached_get, bench_mixed_50_50, bench_eviction);
criterion_main!(benches);
