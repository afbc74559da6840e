//! Generic ODE-solving layer.
//!
//! Every dynamics model in the workspace implements [`OdeSystem`]; the solvers here turn a
//! system plus an initial condition into a [`Trajectory`]. Two integrators are provided:
//! [`Rk4`] for short, fixed-cadence control loops and [`Rkf45`] for long propagations that
//! span several time scales.

pub mod rk4;
pub mod rkf45;
pub mod system;
pub mod trajectory;

pub use rk4::{Rk4, rk4_step};
pub use rkf45::{Rkf45, StepAttempt};
pub use system::{FnSystem, OdeSystem, StopFn};
pub use trajectory::{SolveStats, Termination, Trajectory, TrajectoryRow};

use thiserror::Error;

/// Configuration errors detected before the first step is taken.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationError {
    #[error("initial state is empty")]
    EmptyState,
    #[error("initial state has {actual} components but the system expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("initial state contains non-finite values")]
    NonFiniteState,
    #[error("step size must be positive and finite (got {0})")]
    InvalidStepSize(f64),
    #[error("max_steps must be at least 1")]
    InvalidMaxSteps,
    #[error("tolerance must be positive and finite (got {0})")]
    InvalidTolerance(f64),
    #[error("invalid step-size controller: {0}")]
    InvalidStepControl(&'static str),
}

/// Common contract of the integrators: `solve(f, t0, y0, step, max_steps, stop) -> Trajectory`.
///
/// `y0` is copied, never mutated. The first row of the returned trajectory is `(t0, y0)`.
/// `max_steps` bounds the number of accepted steps; reaching it is reported through
/// [`Termination::MaxSteps`], not as an error. When `stop` returns true after an accepted
/// step the run ends with that step as the last row.
pub trait Integrator {
    fn solve<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t0: f64,
        y0: &[f64],
        step: f64,
        max_steps: usize,
        stop: Option<&StopFn<'_>>,
    ) -> Result<Trajectory, IntegrationError>;
}

/// Fail-fast validation shared by every integrator.
pub fn validate_inputs<S: OdeSystem + ?Sized>(
    system: &S,
    y0: &[f64],
    step: f64,
    max_steps: usize,
) -> Result<(), IntegrationError> {
    if y0.is_empty() {
        return Err(IntegrationError::EmptyState);
    }
    let expected = system.dimension();
    if y0.len() != expected {
        return Err(IntegrationError::DimensionMismatch {
            expected,
            actual: y0.len(),
        });
    }
    if !y0.iter().all(|v| v.is_finite()) {
        return Err(IntegrationError::NonFiniteState);
    }
    if !(step.is_finite() && step > 0.0) {
        return Err(IntegrationError::InvalidStepSize(step));
    }
    if max_steps == 0 {
        return Err(IntegrationError::InvalidMaxSteps);
    }
    Ok(())
}
