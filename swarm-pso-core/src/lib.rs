//! # SwarmPSO Core
//!
//! Per-iteration update operators for particle swarm optimization.
//!
//! This crate provides:
//! - [`SwarmState`]: a shape-validated record of one swarm
//! - Personal-best tracking ([`update_pbest`])
//! - Best selection for star and neighborhood topologies ([`update_gbest`],
//!   [`update_gbest_neighborhood`], [`SwarmTopology`])
//! - Velocity and position integration with rejection constraints
//!   ([`update_velocity`], [`update_position`])
//! - A k-d tree [`SpatialIndex`] for Minkowski k-nearest-neighbor queries
//!
//! Operators borrow the state and return new values; the caller decides what
//! to write back. None of them evaluate an objective function.
//!
//! ```
//! use ndarray::array;
//! use swarm_pso_core::prelude::*;
//!
//! let mut state = SwarmState::builder(array![[0.0], [5.0]], Behavior::default())
//!     .current_cost(array![2.0, 1.0])
//!     .build()?;
//!
//! let pbest = update_pbest(&state);
//! state.set_personal_best(pbest)?;
//!
//! let best = update_gbest(&state);
//! assert_eq!(best.cost, 1.0);
//! # Ok::<(), swarm_pso_core::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod personal;
pub mod position;
pub mod spatial;
pub mod state;
pub mod topology;
pub mod velocity;

pub use personal::{update_pbest, PersonalBest};
pub use position::{update_position, PositionBounds};
pub use spatial::{Euclidean, Manhattan, Metric, MinkowskiOrder, Neighbor, SpatialIndex};
pub use state::{Behavior, SwarmState, SwarmStateBuilder};
pub use topology::{
    best_neighbors, update_gbest, update_gbest_neighborhood, BestSolution, Star,
    SwarmTopology, Topology,
};
pub use velocity::{update_velocity, VelocityClamp, VelocityLimit};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::personal::*;
    pub use crate::position::*;
    pub use crate::state::*;
    pub use crate::topology::*;
    pub use crate::velocity::*;
    pub use crate::{Error, Result};
}

/// Result type for SwarmPSO operations
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for swarm update operations
///
/// Operators fail before producing any output, so a caller that sees an
/// error still holds its previous, consistent state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The swarm state is structurally unusable (empty swarm, zero dimensions)
    #[error("malformed swarm state: {0}")]
    MalformedState(&'static str),
    /// A behavior coefficient, topology parameter or constraint is invalid
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// An array does not have the shape the swarm requires
    #[error("shape mismatch for `{field}`: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Name of the offending field
        field: &'static str,
        /// Shape required by the swarm
        expected: Vec<usize>,
        /// Shape that was supplied
        found: Vec<usize>,
    },
}

impl Error {
    /// Build a [`Error::Configuration`] and log the rejection
    pub fn configuration(msg: impl Into<String>) -> Self {
        let err = Error::Configuration(msg.into());
        tracing::warn!(error = %err, "rejected swarm configuration");
        err
    }

    pub(crate) fn shape(field: &'static str, expected: &[usize], found: &[usize]) -> Self {
        Error::ShapeMismatch {
            field,
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}
