pub mod chromosome;
pub mod cost;
pub mod operators;
pub mod population;
pub mod search;

use std::error::Error;
use std::fmt;

use crate::config::constant;

/// Tuning knobs for the genetic search. Defaults come from `config`.
#[derive(Debug, Clone)]
pub struct SolverParams {
    pub population_size: usize,
    pub generations: usize,
    pub tournament_size: usize,
    pub elite_count: usize,
    pub mutation_rate: f64,
    pub greedy_fraction: f64,
    pub stagnation_limit: usize,
    pub seed: u64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            population_size: constant::POPULATION_SIZE,
            generations: constant::GENERATIONS,
            tournament_size: constant::TOURNAMENT_SIZE,
            elite_count: constant::ELITE_COUNT,
            mutation_rate: constant::MUTATION_RATE,
            greedy_fraction: constant::GREEDY_FRACTION,
            stagnation_limit: constant::STAGNATION_LIMIT,
            seed: constant::SOLVER_SEED,
        }
    }
}

/// Inputs that violate an invariant are rejected before the GA loop.
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    DuplicatePassengerId(i64),
    ZeroCapacity { vehicle_id: i64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicatePassengerId(id) => {
                write!(f, "duplicate passenger id {}", id)
            }
            ValidationError::ZeroCapacity { vehicle_id } => {
                write!(f, "vehicle {} has zero capacity", vehicle_id)
            }
        }
    }
}

impl Error for ValidationError {}
