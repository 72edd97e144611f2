//! Best-position selection for swarm topologies
//!
//! A topology decides which particles influence each other's social term.
//! The star topology reduces over the whole swarm; the ring topology only
//! looks at each particle's k nearest neighbors in position space.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::spatial::{MinkowskiOrder, SpatialIndex};
use crate::state::SwarmState;
use crate::{Error, Result};

/// A swarm-level best position and its cost
#[derive(Debug, Clone, PartialEq)]
pub struct BestSolution {
    /// Best position, length `dimensions`
    pub pos: Array1<f64>,
    /// Cost at `pos`
    pub cost: f64,
}

/// Trait for topologies that pick the position driving the social term
pub trait SwarmTopology: Send + Sync {
    /// Best position and cost under this topology.
    ///
    /// This always reports the topology's current best; whether it replaces
    /// an incumbent is up to the caller.
    fn compute_gbest(&self, state: &SwarmState) -> Result<BestSolution>;
}

/// Whole-swarm topology: every particle sees the global best
#[derive(Debug, Clone, Copy, Default)]
pub struct Star;

impl SwarmTopology for Star {
    fn compute_gbest(&self, state: &SwarmState) -> Result<BestSolution> {
        Ok(update_gbest(state))
    }
}

/// Swarm topology configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Global best over the whole swarm
    #[default]
    Star,
    /// Best among the k nearest neighbors under the Minkowski `p` norm
    Ring { p: MinkowskiOrder, k: usize },
}

impl Topology {
    /// Create a ring topology with the given metric and neighbor count
    pub fn ring(p: MinkowskiOrder, k: usize) -> Self {
        Self::Ring { p, k }
    }

    /// Check parameters that do not depend on the swarm size
    pub fn validate(&self) -> Result<()> {
        match *self {
            Topology::Star => Ok(()),
            Topology::Ring { k, .. } if k == 0 => {
                Err(Error::configuration("neighbor count k must be at least 1"))
            }
            Topology::Ring { .. } => Ok(()),
        }
    }
}

impl SwarmTopology for Topology {
    fn compute_gbest(&self, state: &SwarmState) -> Result<BestSolution> {
        match *self {
            Topology::Star => Star.compute_gbest(state),
            Topology::Ring { p, k } => update_gbest_neighborhood(state, p, k),
        }
    }
}

/// Global best over all personal bests.
///
/// The lowest `pbest_cost` wins, the first particle on ties. NaN costs are
/// ignored unless all costs are NaN.
pub fn update_gbest(state: &SwarmState) -> BestSolution {
    let index = argmin(state.pbest_cost().view());
    BestSolution {
        pos: state.pbest_pos().row(index).to_owned(),
        cost: state.pbest_cost()[index],
    }
}

/// For every particle, the index of the lowest-cost particle among its `k`
/// nearest neighbors (itself included).
///
/// Neighbors are ranked by distance; on equal costs the nearer one wins.
/// With `k == 1` every particle is its own best neighbor. `k` must lie in
/// `[1, n_particles)`.
pub fn best_neighbors(state: &SwarmState, p: MinkowskiOrder, k: usize) -> Result<Array1<usize>> {
    let n = state.n_particles();
    if k == 0 || k >= n {
        return Err(Error::configuration(format!(
            "neighbor count k = {k} must satisfy 1 <= k < n_particles = {n}"
        )));
    }
    if k == 1 {
        return Ok((0..n).collect());
    }

    let index = SpatialIndex::new(state.position().view())?;
    let neighbors = index.neighbors_of_all(k, p)?;
    let costs = state.pbest_cost();

    Ok(neighbors
        .rows()
        .into_iter()
        .map(|row| {
            let local = row.mapv(|j| costs[j]);
            row[argmin(local.view())]
        })
        .collect())
}

/// Best position and cost under a k-nearest-neighbor topology.
///
/// The cost is the lowest best-neighbor cost over the swarm. The position is
/// the personal best of the *particle* holding that neighbor, which is not
/// necessarily the neighbor's own position.
pub fn update_gbest_neighborhood(
    state: &SwarmState,
    p: MinkowskiOrder,
    k: usize,
) -> Result<BestSolution> {
    let best_neighbor = best_neighbors(state, p, k)?;
    let costs = state.pbest_cost();
    let neighbor_cost = best_neighbor.mapv(|j| costs[j]);
    let particle = argmin(neighbor_cost.view());

    tracing::trace!(
        p = p.p(),
        k,
        particle,
        neighbor = best_neighbor[particle],
        "neighborhood best selected"
    );
    Ok(BestSolution {
        pos: state.pbest_pos().row(particle).to_owned(),
        cost: neighbor_cost[particle],
    })
}

fn argmin(values: ArrayView1<'_, f64>) -> usize {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| v < b) {
            best = Some((i, v));
        }
    }
    best.map_or(0, |(i, _)| i)
}
