//! # SwarmPSO
//!
//! **Particle swarm optimization building blocks with explicit state and injectable randomness.**
//!
//! The operators in [`swarm_pso_core`] are pure per-iteration transitions.
//! This crate adds a serializable [`PsoConfig`], the [`advance`] driver that
//! applies one full iteration with all-or-nothing write-back, and a small
//! [`Swarm`] wrapper that owns a state together with its configuration.
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::{array, Axis};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use swarm_pso::prelude::*;
//!
//! let config = PsoConfig::builder()
//!     .behavior(Behavior::new(0.5, 0.3, 0.9)?)
//!     .clamp(VelocityClamp::new(-1.0, 1.0)?)
//!     .build();
//! let mut swarm = Swarm::new(config, array![[1.0, 2.0], [-3.0, 0.5], [0.2, -0.1]])?;
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! for _ in 0..10 {
//!     let costs = swarm
//!         .state()
//!         .position()
//!         .map_axis(Axis(1), |row| row.dot(&row));
//!     swarm.step(costs, &mut rng)?;
//! }
//! assert!(swarm.state().best_cost().is_finite());
//! # Ok::<(), swarm_pso::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! - [`swarm_pso_core`]: swarm state, spatial index and update operators
//! - [`iteration`]: the single-iteration driver

#![forbid(unsafe_code)]

use ndarray::{Array1, Array2};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

// Re-export the core crate
pub use swarm_pso_core as core;

// Re-export commonly used items at the top level
pub use swarm_pso_core::{
    BestSolution, Behavior, Error, MinkowskiOrder, PersonalBest, PositionBounds, Result,
    SwarmState, SwarmTopology, Topology, VelocityClamp,
};

pub mod iteration;

pub use iteration::{advance, IterationReport};

/// Prelude module for convenient imports
///
/// ```rust,ignore
/// use swarm_pso::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::core::MinkowskiOrder;
    pub use crate::iteration::{advance, IterationReport};

    pub use crate::{PsoConfig, Swarm};
}

/// Configuration for one optimization run
///
/// Every field is optional when deserializing; missing fields take their
/// defaults (default behavior, star topology, no clamp, no bounds).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PsoConfig {
    /// Inertia, cognitive and social coefficients
    pub behavior: Behavior,
    /// Which particles share their best positions
    pub topology: Topology,
    /// Velocity rejection range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamp: Option<VelocityClamp>,
    /// Position box constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<PositionBounds>,
}

impl PsoConfig {
    /// Create a new config builder
    pub fn builder() -> PsoConfigBuilder {
        PsoConfigBuilder::new()
    }

    /// Check everything that does not depend on the swarm
    pub fn validate(&self) -> Result<()> {
        self.behavior.validate()?;
        self.topology.validate()?;
        if let Some(clamp) = &self.clamp {
            clamp.validate()?;
        }
        if let Some(bounds) = &self.bounds {
            bounds.validate()?;
        }
        Ok(())
    }

    /// Check the configuration against a concrete swarm
    pub fn validate_for(&self, state: &SwarmState) -> Result<()> {
        self.validate()?;
        if let Topology::Ring { k, .. } = self.topology {
            let n = state.n_particles();
            if k >= n {
                return Err(Error::configuration(format!(
                    "neighbor count k = {k} must be below n_particles = {n}"
                )));
            }
        }
        if let Some(clamp) = &self.clamp {
            clamp.validate_for(state.dimensions())?;
        }
        if let Some(bounds) = &self.bounds {
            bounds.validate_for(state.dimensions())?;
        }
        Ok(())
    }
}

/// Builder for PsoConfig
#[derive(Debug, Default)]
pub struct PsoConfigBuilder {
    config: PsoConfig,
}

impl PsoConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the behavior coefficients
    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.config.behavior = behavior;
        self
    }

    /// Set the topology
    pub fn topology(mut self, topology: Topology) -> Self {
        self.config.topology = topology;
        self
    }

    /// Reject velocity components outside this range
    pub fn clamp(mut self, clamp: VelocityClamp) -> Self {
        self.config.clamp = Some(clamp);
        self
    }

    /// Reject particle moves that leave this box
    pub fn bounds(mut self, bounds: PositionBounds) -> Self {
        self.config.bounds = Some(bounds);
        self
    }

    /// Build the configuration
    pub fn build(self) -> PsoConfig {
        self.config
    }
}

/// A swarm state together with the configuration driving it
#[derive(Debug, Clone)]
pub struct Swarm {
    config: PsoConfig,
    state: SwarmState,
    iterations: u64,
}

impl Swarm {
    /// Create a fresh swarm at `position` (one particle per row)
    pub fn new(config: PsoConfig, position: Array2<f64>) -> Result<Self> {
        let state = SwarmState::builder(position, config.behavior).build()?;
        Self::with_state(config, state)
    }

    /// Wrap an existing state
    pub fn with_state(config: PsoConfig, state: SwarmState) -> Result<Self> {
        config.validate_for(&state)?;
        Ok(Self {
            config,
            state,
            iterations: 0,
        })
    }

    /// Run one iteration with the costs of the current positions
    pub fn step<R>(&mut self, costs: Array1<f64>, rng: &mut R) -> Result<IterationReport>
    where
        R: RngCore + ?Sized,
    {
        let report = advance(&mut self.state, costs, &self.config, rng)?;
        self.iterations += 1;
        Ok(report)
    }

    /// Get the swarm state
    pub fn state(&self) -> &SwarmState {
        &self.state
    }

    /// Get the configuration
    pub fn config(&self) -> &PsoConfig {
        &self.config
    }

    /// Replace the configuration, e.g. to decay inertia between iterations
    pub fn set_config(&mut self, config: PsoConfig) -> Result<()> {
        config.validate_for(&self.state)?;
        self.config = config;
        Ok(())
    }

    /// Number of completed iterations
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Give up the swarm, returning its state
    pub fn into_state(self) -> SwarmState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_config_builder() {
        let config = PsoConfig::builder()
            .topology(Topology::ring(MinkowskiOrder::Manhattan, 2))
            .bounds(PositionBounds::new(vec![-1.0], vec![1.0]).unwrap())
            .build();

        assert_eq!(config.behavior, Behavior::default());
        assert_eq!(config.topology, Topology::Ring { p: MinkowskiOrder::Manhattan, k: 2 });
        assert!(config.clamp.is_none());
        assert!(config.bounds.is_some());
    }

    #[test]
    fn config_is_checked_against_swarm() {
        let config = PsoConfig::builder()
            .topology(Topology::ring(MinkowskiOrder::Euclidean, 3))
            .build();
        assert!(matches!(
            Swarm::new(config, array![[0.0], [1.0], [2.0]]),
            Err(Error::Configuration(_))
        ));

        let config = PsoConfig::builder()
            .clamp(VelocityClamp::per_dimension(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap())
            .build();
        assert!(Swarm::new(config.clone(), array![[0.0, 0.0], [1.0, 1.0]]).is_ok());
        assert!(Swarm::new(config, array![[0.0], [1.0]]).is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: PsoConfig = serde_json::from_str(
            r#"{
                "behavior": {"c1": 0.5, "c2": 0.3, "w": 0.9},
                "topology": {"ring": {"p": 2, "k": 3}},
                "bounds": {"lower": [-5.0, -5.0], "upper": [5.0, 5.0]}
            }"#,
        )
        .unwrap();

        assert_eq!(config.behavior, Behavior { c1: 0.5, c2: 0.3, w: 0.9 });
        assert_eq!(config.topology, Topology::ring(MinkowskiOrder::Euclidean, 3));
        assert!(config.clamp.is_none());
        assert_eq!(config.bounds.as_ref().map(|b| b.dimensions()), Some(2));

        let empty: PsoConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, PsoConfig::default());

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<PsoConfig>(&json).unwrap(), config);
    }
}
