//! Benchmarks for the per-iteration swarm operators.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use swarm_pso_core::prelude::*;
use swarm_pso_core::MinkowskiOrder;

fn random_swarm(n: usize, d: usize) -> SwarmState {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let position = Array2::from_shape_simple_fn((n, d), || rng.gen_range(-5.0..5.0));
    let velocity = Array2::from_shape_simple_fn((n, d), || rng.gen_range(-0.5..0.5));
    let cost = position.rows().into_iter().map(|r| r.dot(&r)).collect();
    SwarmState::builder(position.clone(), Behavior::default())
        .velocity(velocity)
        .personal_best(position, cost)
        .build()
        .expect("benchmark swarm is well formed")
}

fn bench_neighborhood(c: &mut Criterion) {
    let mut group = c.benchmark_group("gbest_neighborhood");
    for n in [50usize, 200, 1000] {
        let state = random_swarm(n, 10);
        group.bench_with_input(BenchmarkId::from_parameter(n), &state, |b, state| {
            b.iter(|| update_gbest_neighborhood(black_box(state), MinkowskiOrder::Euclidean, 5))
        });
    }
    group.finish();
}

fn bench_velocity_position(c: &mut Criterion) {
    let state = random_swarm(1000, 30);
    let clamp = VelocityClamp::new(-1.0, 1.0).expect("valid clamp");
    let bounds = PositionBounds::new(vec![-5.0; 30], vec![5.0; 30]).expect("valid bounds");
    let mut rng = StdRng::seed_from_u64(1);

    c.bench_function("velocity_clamped_1000x30", |b| {
        b.iter(|| update_velocity(black_box(&state), Some(&clamp), &mut rng))
    });
    c.bench_function("position_bounded_1000x30", |b| {
        b.iter(|| update_position(black_box(&state), Some(&bounds)))
    });
    c.bench_function("pbest_1000x30", |b| b.iter(|| update_pbest(black_box(&state))));
}

criterion_group!(benches, bench_neighborhood, bench_velocity_position);
criterion_main!(benches);
