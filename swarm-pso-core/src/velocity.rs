//! Velocity update
//!
//! `v' = w * v + c1 * r1 * (pbest - x) + c2 * r2 * (best - x)` with `r1`, `r2`
//! uniform on `[0, 1)` per cell. An optional clamp rejects components that
//! leave the allowed range: they keep their previous velocity instead of
//! being cut to the limit.

use ndarray::{Array2, Zip};
use rand::distributions::Standard;
use rand::Rng;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::state::{Behavior, SwarmState};
use crate::{Error, Result};

/// One side of a velocity clamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VelocityLimit {
    /// Same limit for every dimension
    Scalar(f64),
    /// One limit per dimension
    PerDimension(Vec<f64>),
}

impl VelocityLimit {
    fn at(&self, dimension: usize) -> f64 {
        match self {
            VelocityLimit::Scalar(v) => *v,
            VelocityLimit::PerDimension(v) => v[dimension],
        }
    }

    fn len(&self) -> Option<usize> {
        match self {
            VelocityLimit::Scalar(_) => None,
            VelocityLimit::PerDimension(v) => Some(v.len()),
        }
    }

    fn has_nan(&self) -> bool {
        match self {
            VelocityLimit::Scalar(v) => v.is_nan(),
            VelocityLimit::PerDimension(v) => v.iter().any(|x| x.is_nan()),
        }
    }
}

/// Allowed velocity range `[min, max]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityClamp {
    pub min: VelocityLimit,
    pub max: VelocityLimit,
}

impl VelocityClamp {
    /// Same range for every dimension
    pub fn new(min: f64, max: f64) -> Result<Self> {
        let clamp = Self {
            min: VelocityLimit::Scalar(min),
            max: VelocityLimit::Scalar(max),
        };
        clamp.validate()?;
        Ok(clamp)
    }

    /// One range per dimension
    pub fn per_dimension(min: Vec<f64>, max: Vec<f64>) -> Result<Self> {
        let clamp = Self {
            min: VelocityLimit::PerDimension(min),
            max: VelocityLimit::PerDimension(max),
        };
        clamp.validate()?;
        Ok(clamp)
    }

    /// Check the limits independently of any swarm
    pub fn validate(&self) -> Result<()> {
        if self.min.has_nan() || self.max.has_nan() {
            return Err(Error::configuration("velocity clamp limits must not be NaN"));
        }
        let len = match (self.min.len(), self.max.len()) {
            (Some(a), Some(b)) if a != b => {
                return Err(Error::configuration(format!(
                    "velocity clamp limits differ in length: {a} vs {b}"
                )))
            }
            (Some(a), _) | (None, Some(a)) => a,
            (None, None) => 1,
        };
        if let Some(j) = (0..len).find(|&j| self.min.at(j) > self.max.at(j)) {
            return Err(Error::configuration(format!(
                "velocity clamp minimum exceeds maximum in dimension {j}"
            )));
        }
        Ok(())
    }

    /// Check the limits against a swarm with `dimensions` dimensions
    pub fn validate_for(&self, dimensions: usize) -> Result<()> {
        self.validate()?;
        for len in [self.min.len(), self.max.len()].into_iter().flatten() {
            if len != dimensions {
                return Err(Error::configuration(format!(
                    "velocity clamp has {len} limits for {dimensions} dimensions"
                )));
            }
        }
        Ok(())
    }

    fn contains(&self, dimension: usize, value: f64) -> bool {
        self.min.at(dimension) <= value && value <= self.max.at(dimension)
    }
}

/// Compute the next velocity matrix.
///
/// Draws the whole `r1` matrix in row-major order and then the whole `r2`
/// matrix from `rng`, so a seeded generator reproduces the output exactly.
pub fn update_velocity<R>(
    state: &SwarmState,
    clamp: Option<&VelocityClamp>,
    rng: &mut R,
) -> Result<Array2<f64>>
where
    R: RngCore + ?Sized,
{
    if let Some(clamp) = clamp {
        clamp.validate_for(state.dimensions())?;
    }
    let Behavior { c1, c2, w } = *state.behavior();

    let x = state.position();
    let r1: Array2<f64> = Array2::from_shape_simple_fn(x.raw_dim(), || rng.sample(Standard));
    let r2: Array2<f64> = Array2::from_shape_simple_fn(x.raw_dim(), || rng.sample(Standard));

    let cognitive = (r1 * c1) * &(state.pbest_pos() - x);
    let social = (r2 * c2) * &(x.mapv(|xi| -xi) + state.best_pos());
    let mut velocity = state.velocity() * w + cognitive + social;

    if let Some(clamp) = clamp {
        let mut rejected = 0usize;
        Zip::indexed(&mut velocity)
            .and(state.velocity())
            .for_each(|(_, j), proposed, &old| {
                if !clamp.contains(j, *proposed) {
                    *proposed = old;
                    rejected += 1;
                }
            });
        tracing::trace!(rejected, "velocity components outside clamp kept previous value");
    }

    Ok(velocity)
}
