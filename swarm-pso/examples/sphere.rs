//! Sphere Example
//!
//! Minimizes the sphere function with a bounded, clamped ring-topology swarm.
//! Run with `RUST_LOG=swarm_pso=debug` to see per-iteration events.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use swarm_pso::prelude::*;

const PARTICLES: usize = 30;
const DIMENSIONS: usize = 4;
const ITERATIONS: usize = 100;

fn sphere(position: &Array2<f64>) -> Array1<f64> {
    position.map_axis(Axis(1), |row| row.dot(&row))
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("SwarmPSO Sphere Example");
    println!("=======================");

    let config = PsoConfig::builder()
        .behavior(Behavior::new(0.5, 0.3, 0.9)?)
        .topology(Topology::ring(MinkowskiOrder::Euclidean, 5))
        .clamp(VelocityClamp::new(-1.0, 1.0)?)
        .bounds(PositionBounds::new(vec![-10.0; DIMENSIONS], vec![10.0; DIMENSIONS])?)
        .build();

    let mut rng = StdRng::seed_from_u64(2024);
    let position =
        Array2::from_shape_simple_fn((PARTICLES, DIMENSIONS), || rng.gen_range(-10.0..10.0));
    let mut swarm = Swarm::new(config, position)?;

    for i in 0..ITERATIONS {
        let costs = sphere(swarm.state().position());
        let report = swarm.step(costs, &mut rng)?;
        if report.best_updated {
            println!("iteration {i:>3}: best cost {:.6}", report.best_cost);
        }
    }

    println!("\nBest position: {}", swarm.state().best_pos());
    println!("Best cost:     {:.6}", swarm.state().best_cost());
    Ok(())
}
