//! Guidance and control for the planar lander.
//!
//! A [`Controller`] turns `(t, state)` into a saturated [`Command`](descent_core::Command).
//! Three variants exist: a precomputed open-loop table, a cascaded PD feedback law, and their
//! sum saturated once to the actuator limits. The [`landing`] module classifies touchdown.

pub mod controller;
pub mod feedback;
pub mod landing;
pub mod open_loop;

pub use controller::{CombinedController, Controller};
pub use feedback::{FeedbackController, FeedbackGains};
pub use landing::{
    LandingOutcome, LandingTolerances, TouchdownReport, classify, classify_with_altitude,
    touchdown_report,
};
pub use open_loop::{OpenLoopProfile, PlanOptions, ProfileEntry, plan_descent};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuidanceError {
    #[error("actuator limits must be finite and non-negative")]
    InvalidLimits,
    #[error("gravity must be finite and non-negative (got {0})")]
    InvalidGravity(f64),
    #[error("feedback gain `{0}` must be finite")]
    InvalidGain(&'static str),
    #[error("expected {expected} gains, got {actual}")]
    GainCount { expected: usize, actual: usize },
    #[error("profile resolution must be positive and finite (got {0})")]
    InvalidResolution(f64),
    #[error("tilt must lie strictly between 0 and π/2 (got {0})")]
    InvalidTilt(f64),
    #[error("target time must be positive and finite (got {0})")]
    InvalidTargetTime(f64),
    #[error("profile rows must be strictly increasing in time")]
    UnorderedProfile,
    #[error("descent plan infeasible: {0}")]
    InfeasiblePlan(&'static str),
    #[error("braking needs {required:.3} m/s² of thrust but only {available:.3} is available")]
    InfeasibleBraking { required: f64, available: f64 },
}
