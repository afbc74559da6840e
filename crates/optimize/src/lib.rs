//! Black-box optimisers over real-valued parameter vectors.
//!
//! Fitness is minimised. Each evaluation is expected to build its own simulation from the
//! genes it receives, so evaluations of different individuals run on rayon worker threads
//! while all random draws stay on the calling thread.

pub mod bounds;
pub mod genetic;
pub mod gradient;
pub mod individual;

pub use bounds::Bounds;
pub use genetic::{GenerationStats, GeneticAlgorithm, GeneticConfig, GeneticResult};
pub use gradient::{GradientConfig, GradientDescent, GradientResult, IterationStats};
pub use individual::{Evaluation, FitnessFunction, Individual, TrajectorySummary};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    #[error("at least one bounded parameter is required")]
    EmptyBounds,
    #[error("bound {index} is invalid: [{lower}, {upper}]")]
    InvalidBound { index: usize, lower: f64, upper: f64 },
    #[error("population size must be at least 2 (got {0})")]
    InvalidPopulation(usize),
    #[error("elite count {elite} must be smaller than the population {population}")]
    InvalidElite { elite: usize, population: usize },
    #[error("tournament size {size} must lie in 1..={population}")]
    InvalidTournament { size: usize, population: usize },
    #[error("{name} must lie in [0, 1] (got {value})")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("{name} must be positive and finite (got {value})")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("starting point has {actual} parameters, bounds have {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Fitness used for ranking: NaN and infinities rank last.
pub fn ranking_score(fitness: f64) -> f64 {
    if fitness.is_finite() {
        fitness
    } else {
        f64::INFINITY
    }
}

pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<(), OptimizeError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(OptimizeError::InvalidParameter { name, value })
    }
}
