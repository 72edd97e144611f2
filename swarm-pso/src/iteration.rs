//! Single-iteration driver
//!
//! Applies the operators in their canonical order against a scratch copy of
//! the state and commits the copy only after every step succeeded:
//!
//! 1. record the externally evaluated costs
//! 2. personal bests
//! 3. topology best, adopted only when it beats the incumbent
//! 4. velocity
//! 5. position
//!
//! Objective evaluation and the stopping rule stay with the caller.

use ndarray::{Array1, Zip};
use rand_core::RngCore;

use swarm_pso_core::{
    update_pbest, update_position, update_velocity, Result, SwarmState, SwarmTopology,
};

use crate::PsoConfig;

/// What changed during one iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// Particles whose personal best improved
    pub improved: usize,
    /// Whether the swarm-level best was replaced
    pub best_updated: bool,
    /// Swarm-level best cost after the iteration
    pub best_cost: f64,
}

/// Advance `state` by one iteration given the costs of its current positions.
///
/// `config.behavior` replaces the state's coefficients first, so callers can
/// schedule them (e.g. decaying inertia) between iterations. On error the
/// state is left exactly as it was.
pub fn advance<R>(
    state: &mut SwarmState,
    costs: Array1<f64>,
    config: &PsoConfig,
    rng: &mut R,
) -> Result<IterationReport>
where
    R: RngCore + ?Sized,
{
    config.validate_for(state)?;

    let mut next = state.clone();
    next.set_behavior(config.behavior)?;
    next.set_current_cost(costs)?;

    let pbest = update_pbest(&next);
    let mut improved = 0usize;
    Zip::from(&pbest.cost)
        .and(next.pbest_cost())
        .for_each(|new, old| {
            if new < old {
                improved += 1;
            }
        });
    next.set_personal_best(pbest)?;

    let candidate = config.topology.compute_gbest(&next)?;
    let best_updated = candidate.cost < next.best_cost();
    if best_updated {
        next.set_best(candidate)?;
    }

    let velocity = update_velocity(&next, config.clamp.as_ref(), rng)?;
    next.set_velocity(velocity)?;
    let position = update_position(&next, config.bounds.as_ref())?;
    next.set_position(position)?;

    let report = IterationReport {
        improved,
        best_updated,
        best_cost: next.best_cost(),
    };
    tracing::debug!(
        improved = report.improved,
        best_updated = report.best_updated,
        best_cost = report.best_cost,
        "swarm advanced"
    );

    *state = next;
    Ok(report)
}
