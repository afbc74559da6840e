//! Planar lander dynamics with thrust, torque, drag and ground contact.
//!
//! State layout: `[x, y, θ, ẋ, ẏ, θ̇]`. `y` is height above the ground datum, `θ` is the tilt
//! from vertical (positive tilts the thrust vector towards +x).

use descent_core::vector::{self, Vector3};
use descent_core::{ActuatorLimits, Command};
use descent_ode::{OdeSystem, Trajectory, rk4_step};

use crate::DynamicsError;
use crate::drag::DragModel;
use crate::environment::Environment;

pub const X: usize = 0;
pub const Y: usize = 1;
pub const THETA: usize = 2;
pub const VX: usize = 3;
pub const VY: usize = 4;
pub const OMEGA: usize = 5;
pub const LANDER_DIMENSION: usize = 6;

/// Named view of a lander state vector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LanderState {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

impl LanderState {
    pub fn new(x: f64, y: f64, theta: f64, vx: f64, vy: f64, omega: f64) -> Self {
        Self {
            x,
            y,
            theta,
            vx,
            vy,
            omega,
        }
    }

    /// Read the first six components of `values`.
    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            x: values[X],
            y: values[Y],
            theta: values[THETA],
            vx: values[VX],
            vy: values[VY],
            omega: values[OMEGA],
        }
    }

    pub fn to_array(&self) -> [f64; LANDER_DIMENSION] {
        [self.x, self.y, self.theta, self.vx, self.vy, self.omega]
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    /// Position in the environment's `[horizontal, vertical, lateral]` frame.
    pub fn position(&self) -> Vector3 {
        [self.x, self.y, 0.0]
    }

    pub fn velocity(&self) -> Vector3 {
        [self.vx, self.vy, 0.0]
    }
}

/// Anything that issues a thrust/torque command from `(t, state)`.
pub trait CommandSource {
    fn command(&self, t: f64, state: &[f64]) -> Command;
}

impl<C: CommandSource + ?Sized> CommandSource for &C {
    fn command(&self, t: f64, state: &[f64]) -> Command {
        (**self).command(t, state)
    }
}

/// Adapter for closures `Fn(t, state) -> Command`.
pub struct CommandFn<F>(pub F);

impl<F> CommandSource for CommandFn<F>
where
    F: Fn(f64, &[f64]) -> Command,
{
    fn command(&self, t: f64, state: &[f64]) -> Command {
        (self.0)(t, state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanderParams {
    /// Surface gravity (m/s²).
    pub gravity: f64,
    /// Vehicle mass (kg); only the drag term depends on it.
    pub mass: f64,
    pub limits: ActuatorLimits,
    /// Altitude below which the ground-contact rule applies (m).
    pub ground_epsilon: f64,
}

impl LanderParams {
    pub fn new(gravity: f64, mass: f64, limits: ActuatorLimits) -> Self {
        Self {
            gravity,
            mass,
            limits,
            ground_epsilon: 1e-3,
        }
    }

    /// One-tonne lander on Titan with 4 m/s² of thrust and 0.5 rad/s² of torque authority.
    pub fn titan() -> Self {
        Self::new(
            descent_core::constants::TITAN_SURFACE_GRAVITY,
            1000.0,
            ActuatorLimits::new(4.0, 0.5),
        )
    }

    pub fn validate(&self) -> Result<(), DynamicsError> {
        if !(self.gravity.is_finite() && self.gravity >= 0.0) {
            return Err(DynamicsError::InvalidLander("gravity must be finite and non-negative"));
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(DynamicsError::InvalidLander("mass must be positive and finite"));
        }
        if !self.limits.is_valid() {
            return Err(DynamicsError::InvalidLander(
                "actuator limits must be finite and non-negative",
            ));
        }
        if !(self.ground_epsilon.is_finite() && self.ground_epsilon >= 0.0) {
            return Err(DynamicsError::InvalidLander(
                "ground epsilon must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

impl Default for LanderParams {
    fn default() -> Self {
        Self::titan()
    }
}

/// Values computed alongside a derivative evaluation, reported but never fed back.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LanderDiagnostics {
    /// Saturated thrust actually applied (m/s²).
    pub thrust: f64,
    /// Saturated torque actually applied (rad/s²).
    pub torque: f64,
    /// Drag force (N).
    pub drag: Vector3,
    pub altitude: f64,
    /// The ground-contact rule cancelled downward acceleration.
    pub ground_contact: bool,
}

/// Lander derivative function: a controller and an environment bound to the vehicle parameters.
pub struct LanderModel<'a, C: ?Sized, E: ?Sized> {
    params: LanderParams,
    controller: &'a C,
    environment: &'a E,
    drag: Option<DragModel>,
}

impl<'a, C, E> LanderModel<'a, C, E>
where
    C: CommandSource + ?Sized,
    E: Environment + ?Sized,
{
    pub fn new(
        params: LanderParams,
        controller: &'a C,
        environment: &'a E,
    ) -> Result<Self, DynamicsError> {
        params.validate()?;
        Ok(Self {
            params,
            controller,
            environment,
            drag: None,
        })
    }

    pub fn with_drag(mut self, drag: DragModel) -> Self {
        self.drag = Some(drag);
        self
    }

    pub fn params(&self) -> &LanderParams {
        &self.params
    }

    pub fn drag(&self) -> Option<&DragModel> {
        self.drag.as_ref()
    }

    /// Derivative at `(t, y)` plus the diagnostics of that evaluation.
    pub fn evaluate(&self, t: f64, y: &[f64]) -> ([f64; LANDER_DIMENSION], LanderDiagnostics) {
        let state = LanderState::from_slice(y);
        let command = self.params.limits.saturate(self.controller.command(t, y));

        let position = state.position();
        let drag = match &self.drag {
            Some(model) => model.force(&position, &state.velocity(), self.environment),
            None => vector::ZERO,
        };
        let altitude = self.environment.altitude(&position);

        let (sin, cos) = state.theta.sin_cos();
        let ax = command.thrust * sin + drag[0] / self.params.mass;
        let mut ay = command.thrust * cos - self.params.gravity + drag[1] / self.params.mass;

        let ground_contact = altitude < self.params.ground_epsilon && ay < 0.0;
        if ground_contact {
            ay = 0.0;
        }

        let derivative = [state.vx, state.vy, state.omega, ax, ay, command.torque];
        let diagnostics = LanderDiagnostics {
            thrust: command.thrust,
            torque: command.torque,
            drag,
            altitude,
            ground_contact,
        };
        (derivative, diagnostics)
    }

    /// One RK4 step of size `h`, reporting the diagnostics at the start of the step.
    pub fn step(&self, t: f64, y: &[f64], h: f64) -> (Vec<f64>, LanderDiagnostics) {
        let (_, diagnostics) = self.evaluate(t, y);
        (rk4_step(self, t, y, h), diagnostics)
    }

    /// Diagnostics recomputed at every row of a finished run.
    pub fn diagnostics_along(&self, trajectory: &Trajectory) -> Vec<LanderDiagnostics> {
        trajectory
            .rows()
            .iter()
            .map(|row| self.evaluate(row.t, &row.state).1)
            .collect()
    }
}

impl<C, E> OdeSystem for LanderModel<'_, C, E>
where
    C: CommandSource + ?Sized,
    E: Environment + ?Sized,
{
    fn dimension(&self) -> usize {
        LANDER_DIMENSION
    }

    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        let (derivative, _) = self.evaluate(t, y);
        dydt.copy_from_slice(&derivative);
    }
}
