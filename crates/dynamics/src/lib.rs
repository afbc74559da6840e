//! Physical models that supply derivative functions to the solvers.

pub mod drag;
pub mod engine;
pub mod environment;
pub mod lander;
pub mod nbody;

pub use drag::{AtmosphereProfile, DragModel};
pub use engine::PhysicsEngine;
pub use environment::{Environment, GradientNoise, SyntheticEnvironment, TerrainModel, WindModel};
pub use lander::{
    CommandFn, CommandSource, LANDER_DIMENSION, LanderDiagnostics, LanderModel, LanderParams, LanderState,
};
pub use nbody::{BODY_STRIDE, Body, FrozenBodies, NBodySystem, ProbeGravity, pack_state};

use thiserror::Error;

/// Invalid physical parameters, reported when a model is constructed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DynamicsError {
    #[error("body {index} mass must be positive and finite (got {mass})")]
    InvalidMass { index: usize, mass: f64 },
    #[error("softening length must be finite and non-negative (got {0})")]
    InvalidSoftening(f64),
    #[error("gravitational constant must be positive and finite (got {0})")]
    InvalidGravitationalConstant(f64),
    #[error("body index {index} out of range for {count} bodies")]
    BodyIndexOutOfRange { index: usize, count: usize },
    #[error("snapshot sizes disagree: {masses} masses, {before} before, {after} after")]
    SnapshotMismatch {
        masses: usize,
        before: usize,
        after: usize,
    },
    #[error("interpolation interval must be positive and finite (got {0})")]
    InvalidInterval(f64),
    #[error("drag coefficient must be finite and non-negative (got {0})")]
    InvalidDragCoefficient(f64),
    #[error("drag ceiling must be finite and non-negative (got {0})")]
    InvalidDragCeiling(f64),
    #[error("atmosphere scale height must be positive (got {0})")]
    InvalidScaleHeight(f64),
    #[error("noise wavelength must be positive and finite (got {0})")]
    InvalidWavelength(f64),
    #[error("invalid lander parameters: {0}")]
    InvalidLander(&'static str),
}
