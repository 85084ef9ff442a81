use cache_rs::config::{
    FifoCacheConfig, LfuCacheConfig, LfudaCacheConfig, LruCacheConfig, RrCacheConfig,
};
use cache_rs::{Allow, FifoCache, LfuCache, LfudaCache, LruCache, Peek, RrCache};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::num::NonZeroUsize;

const CACHE_SIZE: usize = 1000;

fn fill<F>(cache_size: usize, mut insert: F)
where
    F: FnMut(usize),
{
    for i in 0..cache_size {
        insert(i);
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Cache Operations");

    {
        let cache: FifoCache<usize, usize> =
            FifoCache::from_config(FifoCacheConfig::new(NonZeroUsize::new(CACHE_SIZE).unwrap()));
        fill(CACHE_SIZE, |i| {
            cache.insert(i, i, Allow::InsertOrUpdate);
        });
        group.bench_function("FIFO find hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.find(&(i % CACHE_SIZE)));
                }
            });
        });
        group.bench_function("FIFO find miss", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.find(&(i + CACHE_SIZE)));
                }
            });
        });
        group.bench_function("FIFO insert existing", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.insert(i % CACHE_SIZE, i, Allow::InsertOrUpdate));
                }
            });
        });
    }

    {
        let cache: LruCache<usize, usize> =
            LruCache::from_config(LruCacheConfig::new(NonZeroUsize::new(CACHE_SIZE).unwrap()));
        fill(CACHE_SIZE, |i| {
            cache.insert(i, i, Allow::InsertOrUpdate);
        });
        group.bench_function("LRU find hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.find(&(i % CACHE_SIZE), Peek::No));
                }
            });
        });
        group.bench_function("LRU find miss", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.find(&(i + CACHE_SIZE), Peek::No));
                }
            });
        });
    }

    {
        let cache: LfuCache<usize, usize> =
            LfuCache::from_config(LfuCacheConfig::new(NonZeroUsize::new(CACHE_SIZE).unwrap()));
        fill(CACHE_SIZE, |i| {
            cache.insert(i, i, Allow::InsertOrUpdate);
        });
        group.bench_function("LFU find hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.find(&(i % CACHE_SIZE), Peek::No));
                }
            });
        });
    }

    {
        let cache: LfudaCache<usize, usize> =
            LfudaCache::from_config(LfudaCacheConfig::new(NonZeroUsize::new(CACHE_SIZE).unwrap()));
        fill(CACHE_SIZE, |i| {
            cache.insert(i, i, Allow::InsertOrUpdate);
        });
        group.bench_function("LFUDA find hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.find(&(i % CACHE_SIZE), Peek::No));
                }
            });
        });
    }

    {
        let cache: RrCache<usize, usize> =
            RrCache::from_config_seeded(
                RrCacheConfig::new(NonZeroUsize::new(CACHE_SIZE).unwrap()),
                Default::default(),
                42,
            );
        fill(CACHE_SIZE, |i| {
            cache.insert(i, i, Allow::InsertOrUpdate);
        });
        group.bench_function("RR find hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.find(&(i % CACHE_SIZE), Peek::No));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
