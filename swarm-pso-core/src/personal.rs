//! Personal-best tracking

use ndarray::{Array1, Array2, Zip};

use crate::state::SwarmState;

/// Personal best positions and costs of every particle
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalBest {
    /// Best position per particle, shape `(n_particles, dimensions)`
    pub pos: Array2<f64>,
    /// Cost at `pos`, length `n_particles`
    pub cost: Array1<f64>,
}

/// Compare current costs against personal bests.
///
/// A particle adopts its current position only when its current cost is
/// strictly lower than its personal best; ties and NaN costs keep the old
/// personal best. Applying the result and calling again with the same
/// `current_cost` changes nothing.
pub fn update_pbest(state: &SwarmState) -> PersonalBest {
    let mut pos = state.pbest_pos().clone();
    let mut cost = state.pbest_cost().clone();
    let mut improved = 0usize;

    Zip::from(pos.rows_mut())
        .and(&mut cost)
        .and(state.position().rows())
        .and(state.current_cost())
        .for_each(|mut best_row, best_cost, row, &current| {
            if current < *best_cost {
                best_row.assign(&row);
                *best_cost = current;
                improved += 1;
            }
        });

    tracing::trace!(improved, n_particles = state.n_particles(), "personal bests updated");
    PersonalBest { pos, cost }
}
