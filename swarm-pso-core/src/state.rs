//! Swarm state record
//!
//! [`SwarmState`] holds everything the update operators read. Shapes are
//! checked once, when the state is built or a field is replaced, so the
//! operators themselves never see a malformed swarm.

use std::collections::HashMap;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::personal::PersonalBest;
use crate::topology::BestSolution;
use crate::{Error, Result};

/// PSO behavior coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    /// Cognitive coefficient (attraction to personal best)
    pub c1: f64,
    /// Social coefficient (attraction to global or neighborhood best)
    pub c2: f64,
    /// Inertia weight (momentum)
    pub w: f64,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            c1: 1.5,
            c2: 1.5,
            w: 0.7,
        }
    }
}

impl Behavior {
    /// Create validated behavior coefficients
    pub fn new(c1: f64, c2: f64, w: f64) -> Result<Self> {
        let behavior = Self { c1, c2, w };
        behavior.validate()?;
        Ok(behavior)
    }

    /// Build from a string-keyed mapping with the keys `c1`, `c2` and `w`.
    ///
    /// Unknown keys are ignored.
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self> {
        let key = |name: &str| {
            map.get(name)
                .copied()
                .ok_or_else(|| Error::configuration(format!("behavior is missing `{name}`")))
        };
        Self::new(key("c1")?, key("c2")?, key("w")?)
    }

    /// Check that every coefficient is usable.
    ///
    /// `c1` and `c2` must be finite and non-negative, `w` must be finite.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("c1", self.c1), ("c2", self.c2)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::configuration(format!(
                    "`{name}` must be a finite non-negative number, got {value}"
                )));
            }
        }
        if !self.w.is_finite() {
            return Err(Error::configuration(format!(
                "`w` must be finite, got {}",
                self.w
            )));
        }
        Ok(())
    }
}

/// State of one swarm between iterations
///
/// `n_particles` and `dimensions` are read off the position matrix; every
/// other field is kept consistent with them.
#[derive(Debug, Clone, PartialEq)]
pub struct SwarmState {
    position: Array2<f64>,
    velocity: Array2<f64>,
    current_cost: Array1<f64>,
    pbest_pos: Array2<f64>,
    pbest_cost: Array1<f64>,
    best_pos: Array1<f64>,
    best_cost: f64,
    behavior: Behavior,
}

impl SwarmState {
    /// Start building a swarm from its initial positions
    pub fn builder(position: Array2<f64>, behavior: Behavior) -> SwarmStateBuilder {
        SwarmStateBuilder {
            position,
            behavior,
            velocity: None,
            current_cost: None,
            personal_best: None,
            best: None,
        }
    }

    /// Number of particles
    pub fn n_particles(&self) -> usize {
        self.position.nrows()
    }

    /// Number of dimensions of the search space
    pub fn dimensions(&self) -> usize {
        self.position.ncols()
    }

    pub fn position(&self) -> &Array2<f64> {
        &self.position
    }

    pub fn velocity(&self) -> &Array2<f64> {
        &self.velocity
    }

    pub fn current_cost(&self) -> &Array1<f64> {
        &self.current_cost
    }

    pub fn pbest_pos(&self) -> &Array2<f64> {
        &self.pbest_pos
    }

    pub fn pbest_cost(&self) -> &Array1<f64> {
        &self.pbest_cost
    }

    pub fn best_pos(&self) -> &Array1<f64> {
        &self.best_pos
    }

    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// Replace the position matrix
    pub fn set_position(&mut self, position: Array2<f64>) -> Result<()> {
        self.check_matrix("position", &position)?;
        self.position = position;
        Ok(())
    }

    /// Replace the velocity matrix
    pub fn set_velocity(&mut self, velocity: Array2<f64>) -> Result<()> {
        self.check_matrix("velocity", &velocity)?;
        self.velocity = velocity;
        Ok(())
    }

    /// Record the objective values evaluated at the current positions
    pub fn set_current_cost(&mut self, cost: Array1<f64>) -> Result<()> {
        self.check_particles("current_cost", &cost)?;
        self.current_cost = cost;
        Ok(())
    }

    /// Write back the output of [`update_pbest`](crate::update_pbest)
    pub fn set_personal_best(&mut self, pbest: PersonalBest) -> Result<()> {
        self.check_matrix("pbest_pos", &pbest.pos)?;
        self.check_particles("pbest_cost", &pbest.cost)?;
        self.pbest_pos = pbest.pos;
        self.pbest_cost = pbest.cost;
        Ok(())
    }

    /// Write back a swarm-level best
    pub fn set_best(&mut self, best: BestSolution) -> Result<()> {
        let d = self.dimensions();
        if best.pos.len() != d {
            return Err(Error::shape("best_pos", &[d], best.pos.shape()));
        }
        self.best_pos = best.pos;
        self.best_cost = best.cost;
        Ok(())
    }

    /// Replace the behavior coefficients
    pub fn set_behavior(&mut self, behavior: Behavior) -> Result<()> {
        behavior.validate()?;
        self.behavior = behavior;
        Ok(())
    }

    fn check_matrix(&self, field: &'static str, matrix: &Array2<f64>) -> Result<()> {
        check_matrix(field, matrix, self.n_particles(), self.dimensions())
    }

    fn check_particles(&self, field: &'static str, vector: &Array1<f64>) -> Result<()> {
        check_vector(field, vector, self.n_particles())
    }
}

/// Builder for [`SwarmState`]
///
/// Fields left unset get the values a freshly seeded swarm has: zero
/// velocity, infinite current and personal-best costs, personal bests equal
/// to the initial positions, and an infinite-cost best at the origin.
#[derive(Debug, Clone)]
pub struct SwarmStateBuilder {
    position: Array2<f64>,
    behavior: Behavior,
    velocity: Option<Array2<f64>>,
    current_cost: Option<Array1<f64>>,
    personal_best: Option<(Array2<f64>, Array1<f64>)>,
    best: Option<(Array1<f64>, f64)>,
}

impl SwarmStateBuilder {
    pub fn velocity(mut self, velocity: Array2<f64>) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn current_cost(mut self, cost: Array1<f64>) -> Self {
        self.current_cost = Some(cost);
        self
    }

    pub fn personal_best(mut self, pos: Array2<f64>, cost: Array1<f64>) -> Self {
        self.personal_best = Some((pos, cost));
        self
    }

    pub fn best(mut self, pos: Array1<f64>, cost: f64) -> Self {
        self.best = Some((pos, cost));
        self
    }

    /// Validate shapes and behavior, producing the state
    pub fn build(self) -> Result<SwarmState> {
        let (n, d) = self.position.dim();
        if n == 0 {
            return Err(Error::MalformedState("swarm has no particles"));
        }
        if d == 0 {
            return Err(Error::MalformedState("search space has no dimensions"));
        }
        self.behavior.validate()?;

        let velocity = self.velocity.unwrap_or_else(|| Array2::zeros((n, d)));
        check_matrix("velocity", &velocity, n, d)?;

        let current_cost = self
            .current_cost
            .unwrap_or_else(|| Array1::from_elem(n, f64::INFINITY));
        check_vector("current_cost", &current_cost, n)?;

        let (pbest_pos, pbest_cost) = self.personal_best.unwrap_or_else(|| {
            (self.position.clone(), Array1::from_elem(n, f64::INFINITY))
        });
        check_matrix("pbest_pos", &pbest_pos, n, d)?;
        check_vector("pbest_cost", &pbest_cost, n)?;

        let (best_pos, best_cost) = self
            .best
            .unwrap_or_else(|| (Array1::zeros(d), f64::INFINITY));
        if best_pos.len() != d {
            return Err(Error::shape("best_pos", &[d], best_pos.shape()));
        }

        Ok(SwarmState {
            position: self.position,
            velocity,
            current_cost,
            pbest_pos,
            pbest_cost,
            best_pos,
            best_cost,
            behavior: self.behavior,
        })
    }
}

fn check_matrix(field: &'static str, matrix: &Array2<f64>, n: usize, d: usize) -> Result<()> {
    if matrix.dim() != (n, d) {
        return Err(Error::shape(field, &[n, d], matrix.shape()));
    }
    Ok(())
}

fn check_vector(field: &'static str, vector: &Array1<f64>, n: usize) -> Result<()> {
    if vector.len() != n {
        return Err(Error::shape(field, &[n], vector.shape()));
    }
    Ok(())
}
