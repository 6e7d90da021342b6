//! Benchmarks for the decision engine
//!
//! Run with: cargo bench -p coopsense-core --bench switch_bench

use coopsense_core::prelude::*;
use coopsense_core::switch::conditional_probability;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_trace(channels: usize, steps: usize, seed: u64) -> Vec<Snapshot> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..steps)
        .map(|_| {
            (0..channels)
                .map(|_| {
                    if rng.gen_bool(0.5) {
                        ChannelState::Occupied
                    } else {
                        ChannelState::Empty
                    }
                })
                .collect()
        })
        .collect()
}

// ============================================================================
// Conditional Probability
// ============================================================================

fn bench_conditional_probability(c: &mut Criterion) {
    let mut group = c.benchmark_group("conditional_probability");

    for rows in [64usize, 256, 1024] {
        let history: Vec<Snapshot> = random_trace(8, rows, 1)
            .into_iter()
            .map(|row| {
                let sensed = ChannelMap::from_pairs(8, [(0, row[0]), (1, row[1])]).unwrap();
                sensed.to_snapshot()
            })
            .collect();
        let joint = ChannelMap::from_pairs(8, [(0, ChannelState::Occupied), (1, ChannelState::Empty)])
            .unwrap()
            .to_joint();

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &rows, |b, _| {
            b.iter(|| conditional_probability(black_box(5), &joint, &history))
        });
    }

    group.finish();
}

// ============================================================================
// Full Step
// ============================================================================

fn bench_step(c: &mut Criterion) {
    let trace = random_trace(8, 4096, 2);

    c.bench_function("coop_step_8ch_1024cache", |b| {
        b.iter(|| {
            let mut coop = CoopController::new(EngineConfig::default().with_seed(3)).unwrap();
            for snapshot in &trace {
                black_box(coop.step(snapshot).unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_conditional_probability, bench_step);
criterion_main!(benches);
