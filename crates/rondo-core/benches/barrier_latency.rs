//! Criterion micro-benchmarks: per-episode barrier latency.
//!
//! One bench thread plays a fixed participant while helper threads loop on
//! the barrier; each iteration measures a full rendezvous episode. The
//! rendezvous ordering guarantee makes the stop flag visible to helpers
//! without extra synchronization: it is stored before the final episode's
//! wait, so every helper observes it after that wait returns.
//! `std::sync::Barrier` is included as the baseline the spin barriers are
//! meant to beat.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rondo_core::{CentralizedBarrier, GlobalTreeBarrier, Locality, TreeBarrier};

const THREAD_COUNTS: [usize; 2] = [2, 4];

/// Drive `leader_wait` from the bench thread while `helpers` loop on their
/// own waits until the stop flag is published through the barrier.
fn run_with_helpers(
    b: &mut criterion::Bencher<'_>,
    stop: &Arc<AtomicBool>,
    helpers: Vec<thread::JoinHandle<()>>,
    mut leader_wait: impl FnMut(),
) {
    b.iter(&mut leader_wait);
    stop.store(true, Ordering::Relaxed);
    leader_wait();
    for helper in helpers {
        helper.join().expect("helper must not panic");
    }
}

fn bench_centralized(c: &mut Criterion) {
    let mut group = c.benchmark_group("barrier_episode/centralized");
    group.throughput(Throughput::Elements(1));

    for &n in &THREAD_COUNTS {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let barrier = CentralizedBarrier::new(n).unwrap();
            let stop = Arc::new(AtomicBool::new(false));
            let helpers: Vec<_> = (0..n - 1)
                .map(|_| {
                    let mut handle = barrier.clone();
                    let stop = Arc::clone(&stop);
                    thread::spawn(move || loop {
                        handle.wait();
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                    })
                })
                .collect();
            let mut leader = barrier;
            run_with_helpers(b, &stop, helpers, || {
                leader.wait();
            });
        });
    }
    group.finish();
}

fn bench_tree_local(c: &mut Criterion) {
    let mut group = c.benchmark_group("barrier_episode/tree_local");
    group.throughput(Throughput::Elements(1));

    for &n in &THREAD_COUNTS {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut waiters = TreeBarrier::with_layout(n, Locality::Good).unwrap();
            let stop = Arc::new(AtomicBool::new(false));
            let mut leader = waiters.remove(0);
            let helpers: Vec<_> = waiters
                .into_iter()
                .map(|mut w| {
                    let stop = Arc::clone(&stop);
                    thread::spawn(move || loop {
                        w.wait();
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                    })
                })
                .collect();
            run_with_helpers(b, &stop, helpers, || {
                leader.wait();
            });
        });
    }
    group.finish();
}

fn bench_tree_global(c: &mut Criterion) {
    let mut group = c.benchmark_group("barrier_episode/tree_global");
    group.throughput(Throughput::Elements(1));

    for &n in &THREAD_COUNTS {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut waiters = GlobalTreeBarrier::with_layout(n, Locality::Good).unwrap();
            let stop = Arc::new(AtomicBool::new(false));
            let mut leader = waiters.remove(0);
            let helpers: Vec<_> = waiters
                .into_iter()
                .map(|mut w| {
                    let stop = Arc::clone(&stop);
                    thread::spawn(move || loop {
                        w.wait();
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                    })
                })
                .collect();
            run_with_helpers(b, &stop, helpers, || {
                leader.wait();
            });
        });
    }
    group.finish();
}

fn bench_std_baseline(c: &mut Criterion) {
    let mut group = c.benchmark_group("barrier_episode/std");
    group.throughput(Throughput::Elements(1));

    for &n in &THREAD_COUNTS {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let barrier = Arc::new(std::sync::Barrier::new(n));
            let stop = Arc::new(AtomicBool::new(false));
            let helpers: Vec<_> = (0..n - 1)
                .map(|_| {
                    let barrier = Arc::clone(&barrier);
                    let stop = Arc::clone(&stop);
                    thread::spawn(move || loop {
                        barrier.wait();
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                    })
                })
                .collect();
            run_with_helpers(b, &stop, helpers, || {
                barrier.wait();
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_centralized,
    bench_tree_local,
    bench_tree_global,
    bench_std_baseline
);
criterion_main!(benches);
