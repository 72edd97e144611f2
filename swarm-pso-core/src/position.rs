//! Position update
//!
//! One Euler step `x' = x + v`. With bounds, a particle whose new position
//! leaves the box in any dimension keeps its entire old position.

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::state::SwarmState;
use crate::{Error, Result};

/// Box constraint `[lower, upper]` on positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl PositionBounds {
    /// Create bounds; both vectors need one entry per dimension
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Number of dimensions the bounds describe
    pub fn dimensions(&self) -> usize {
        self.lower.len()
    }

    /// Check the bounds independently of any swarm
    pub fn validate(&self) -> Result<()> {
        if self.lower.len() != self.upper.len() {
            return Err(Error::configuration(format!(
                "position bounds differ in length: {} vs {}",
                self.lower.len(),
                self.upper.len()
            )));
        }
        let nan = self.lower.iter().chain(&self.upper).any(|x| x.is_nan());
        if nan {
            return Err(Error::configuration("position bounds must not be NaN"));
        }
        if let Some(j) = (0..self.lower.len()).find(|&j| self.lower[j] > self.upper[j]) {
            return Err(Error::configuration(format!(
                "lower position bound exceeds upper bound in dimension {j}"
            )));
        }
        Ok(())
    }

    /// Check the bounds against a swarm with `dimensions` dimensions
    pub fn validate_for(&self, dimensions: usize) -> Result<()> {
        self.validate()?;
        if self.dimensions() != dimensions {
            return Err(Error::configuration(format!(
                "position bounds have {} entries for {dimensions} dimensions",
                self.dimensions()
            )));
        }
        Ok(())
    }

    /// Whether every coordinate of `point` lies inside the box
    pub fn contains(&self, point: impl IntoIterator<Item = f64>) -> bool {
        point
            .into_iter()
            .zip(self.lower.iter().zip(&self.upper))
            .all(|(x, (&lo, &hi))| lo <= x && x <= hi)
    }
}

/// Compute the next position matrix
pub fn update_position(state: &SwarmState, bounds: Option<&PositionBounds>) -> Result<Array2<f64>> {
    if let Some(bounds) = bounds {
        bounds.validate_for(state.dimensions())?;
    }

    let mut position = state.position() + state.velocity();

    if let Some(bounds) = bounds {
        let mut rejected = 0usize;
        Zip::from(position.rows_mut())
            .and(state.position().rows())
            .for_each(|mut proposed, old| {
                if !bounds.contains(proposed.iter().copied()) {
                    proposed.assign(&old);
                    rejected += 1;
                }
            });
        tracing::trace!(rejected, "particles leaving bounds kept previous position");
    }

    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Behavior;
    use ndarray::array;

    fn swarm(position: Array2<f64>, velocity: Array2<f64>) -> SwarmState {
        SwarmState::builder(position, Behavior::default())
            .velocity(velocity)
            .build()
            .unwrap()
    }

    #[test]
    fn unbounded_step_adds_velocity() {
        let state = swarm(array![[1.0, 1.0]], array![[0.1, 0.1]]);
        let got = update_position(&state, None).unwrap();
        assert_eq!(got, array![[1.1, 1.1]]);
    }

    #[test]
    fn infeasible_particle_keeps_whole_row() {
        let state = swarm(
            array![[0.0, 0.0], [0.5, 0.5], [0.9, 0.0]],
            array![[0.5, 0.5], [0.2, 0.8], [0.2, 0.2]],
        );
        let bounds = PositionBounds::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();
        let got = update_position(&state, Some(&bounds)).unwrap();

        assert_eq!(got.row(0), array![0.5, 0.5]);
        // 0.7 would be feasible, but 1.3 is not: the whole particle stays put.
        assert_eq!(got.row(1), array![0.5, 0.5]);
        assert_eq!(got.row(2), array![0.9, 0.0]);
    }

    #[test]
    fn bounds_are_inclusive() {
        let state = swarm(array![[0.5, -0.5]], array![[0.5, -0.5]]);
        let bounds = PositionBounds::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();
        let got = update_position(&state, Some(&bounds)).unwrap();
        assert_eq!(got, array![[1.0, -1.0]]);
    }

    #[test]
    fn bounds_must_fit_the_swarm() {
        let state = swarm(array![[0.0, 0.0]], array![[0.0, 0.0]]);
        let bounds = PositionBounds::new(vec![-1.0; 3], vec![1.0; 3]).unwrap();
        assert!(matches!(
            update_position(&state, Some(&bounds)),
            Err(Error::Configuration(_))
        ));

        assert!(PositionBounds::new(vec![0.0], vec![1.0, 2.0]).is_err());
        assert!(PositionBounds::new(vec![2.0], vec![1.0]).is_err());
        assert!(PositionBounds::new(vec![f64::NAN], vec![1.0]).is_err());
    }
}
