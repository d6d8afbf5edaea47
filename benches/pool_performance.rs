//! Pool performance benchmark: allocation vs pooled Field/Tag reuse.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flowtag::pool::{acquire_tag, clone_tag, release_tag, ObjectPool};
use flowtag::{Code, Field, Tag};
use std::sync::Arc;
use std::thread;

fn bench_allocation_vs_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation_vs_pool");

    group.bench_function("allocation", |b| {
        b.iter(|| {
            let mut tag = Box::<Tag>::default();
            tag.server_port = 80;
            black_box(tag);
        })
    });

    let pool: ObjectPool<Tag> = ObjectPool::with_warm_up(1000, 100);
    group.bench_function("pool", |b| {
        b.iter(|| {
            let mut tag = pool.acquire();
            tag.server_port = 80;
            pool.release(Some(black_box(tag)));
        })
    });

    group.bench_function("global_pool", |b| {
        b.iter(|| {
            let mut tag = acquire_tag();
            tag.server_port = 80;
            release_tag(Some(black_box(tag)));
        })
    });

    group.finish();
}

fn bench_clone(c: &mut Criterion) {
    let mut src = Field::default().new_tag(Code::NETWORK_MAP);
    src.set_ip6("2001:db8::1".parse().unwrap_or(std::net::Ipv6Addr::LOCALHOST));
    src.set_ip61("2001:db8::2".parse().unwrap_or(std::net::Ipv6Addr::LOCALHOST));
    src.app_service = "checkout".to_string();

    c.bench_function("clone_tag", |b| {
        b.iter(|| release_tag(Some(clone_tag(black_box(&src)))))
    });
}

fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_acquire_release");

    for threads in [2usize, 4, 8] {
        let pool: Arc<ObjectPool<Tag>> = Arc::new(ObjectPool::with_warm_up(1024, 1024));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let pool = Arc::clone(&pool);
                        thread::spawn(move || {
                            for _ in 0..1000 {
                                let tag = pool.acquire();
                                pool.release(Some(tag));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    let _ = handle.join();
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_allocation_vs_pool, bench_clone, bench_concurrent);
criterion_main!(benches);
