//! Softened Newtonian gravity for N mutually attracting bodies.
//!
//! State layout: six values per body, `[x, y, z, vx, vy, vz]`, concatenated in body order.

use descent_core::constants::G;
use descent_core::vector::{self, Vector3};
use descent_ode::OdeSystem;

use crate::DynamicsError;

/// Values per body in a packed N-body state.
pub const BODY_STRIDE: usize = 6;

/// A point mass with its initial conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub name: String,
    pub mass: f64,
    pub position: Vector3,
    pub velocity: Vector3,
}

impl Body {
    pub fn new(name: impl Into<String>, mass: f64, position: Vector3, velocity: Vector3) -> Self {
        Self {
            name: name.into(),
            mass,
            position,
            velocity,
        }
    }
}

/// Concatenate body positions and velocities into a flat state vector.
pub fn pack_state(bodies: &[Body]) -> Vec<f64> {
    let mut state = Vec::with_capacity(bodies.len() * BODY_STRIDE);
    for body in bodies {
        state.extend_from_slice(&body.position);
        state.extend_from_slice(&body.velocity);
    }
    state
}

pub fn body_position(state: &[f64], index: usize) -> Vector3 {
    vector::from_slice(state, index * BODY_STRIDE)
}

pub fn body_velocity(state: &[f64], index: usize) -> Vector3 {
    vector::from_slice(state, index * BODY_STRIDE + 3)
}

/// Distance between two bodies in a packed state.
pub fn separation(state: &[f64], a: usize, b: usize) -> f64 {
    vector::norm(&vector::sub(
        &body_position(state, a),
        &body_position(state, b),
    ))
}

/// `G * m * r / (|r|² + ε²)^{3/2}`; zero when both the separation and the softening vanish.
#[inline]
pub(crate) fn softened_pull(
    gravitational_constant: f64,
    mass: f64,
    r: &Vector3,
    softening: f64,
) -> Vector3 {
    let d2 = vector::dot(r, r) + softening * softening;
    if d2 == 0.0 {
        return vector::ZERO;
    }
    let inv_d = d2.sqrt().recip();
    vector::scale(r, gravitational_constant * mass * inv_d * inv_d * inv_d)
}

/// Softened mutual gravity on each body, visiting every pair once.
pub(crate) fn pairwise_accelerations(
    gravitational_constant: f64,
    softening: f64,
    masses: &[f64],
    positions: &[Vector3],
) -> Vec<Vector3> {
    let n = masses.len().min(positions.len());
    let mut out = vec![vector::ZERO; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r = vector::sub(&positions[j], &positions[i]);
            let on_i = softened_pull(gravitational_constant, masses[j], &r, softening);
            let on_j = softened_pull(gravitational_constant, masses[i], &r, softening);
            out[i] = vector::add(&out[i], &on_i);
            out[j] = vector::sub(&out[j], &on_j);
        }
    }
    out
}

pub(crate) fn validate_masses(masses: &[f64]) -> Result<(), DynamicsError> {
    for (index, &mass) in masses.iter().enumerate() {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(DynamicsError::InvalidMass { index, mass });
        }
    }
    Ok(())
}

pub(crate) fn validate_softening(softening: f64) -> Result<(), DynamicsError> {
    if !(softening.is_finite() && softening >= 0.0) {
        return Err(DynamicsError::InvalidSoftening(softening));
    }
    Ok(())
}

/// Derivative function for the mutually gravitating bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct NBodySystem {
    masses: Vec<f64>,
    gravitational_constant: f64,
    softening: f64,
    fixed: Option<usize>,
}

impl NBodySystem {
    pub fn new(masses: Vec<f64>, softening: f64) -> Result<Self, DynamicsError> {
        validate_masses(&masses)?;
        validate_softening(softening)?;
        Ok(Self {
            masses,
            gravitational_constant: G,
            softening,
            fixed: None,
        })
    }

    pub fn from_bodies(bodies: &[Body], softening: f64) -> Result<Self, DynamicsError> {
        Self::new(bodies.iter().map(|b| b.mass).collect(), softening)
    }

    pub fn with_gravitational_constant(mut self, value: f64) -> Result<Self, DynamicsError> {
        if !(value.is_finite() && value > 0.0) {
            return Err(DynamicsError::InvalidGravitationalConstant(value));
        }
        self.gravitational_constant = value;
        Ok(self)
    }

    /// Hold one body at rest: its whole derivative is zero.
    pub fn with_fixed_body(mut self, index: usize) -> Result<Self, DynamicsError> {
        if index >= self.masses.len() {
            return Err(DynamicsError::BodyIndexOutOfRange {
                index,
                count: self.masses.len(),
            });
        }
        self.fixed = Some(index);
        Ok(self)
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn body_count(&self) -> usize {
        self.masses.len()
    }

    pub fn gravitational_constant(&self) -> f64 {
        self.gravitational_constant
    }

    pub fn softening(&self) -> f64 {
        self.softening
    }

    pub fn fixed_body(&self) -> Option<usize> {
        self.fixed
    }

    /// Acceleration of every body for the positions stored in `state`.
    pub fn accelerations(&self, state: &[f64]) -> Vec<Vector3> {
        let positions: Vec<Vector3> = (0..self.masses.len())
            .map(|i| body_position(state, i))
            .collect();
        let mut out = pairwise_accelerations(
            self.gravitational_constant,
            self.softening,
            &self.masses,
            &positions,
        );
        if let Some(fixed) = self.fixed {
            out[fixed] = vector::ZERO;
        }
        out
    }

    /// Kinetic plus softened potential energy.
    pub fn total_energy(&self, state: &[f64]) -> f64 {
        let n = self.masses.len();
        let mut kinetic = 0.0;
        let mut potential = 0.0;
        for i in 0..n {
            let v = body_velocity(state, i);
            kinetic += 0.5 * self.masses[i] * vector::dot(&v, &v);
            for j in (i + 1)..n {
                let r = separation(state, i, j);
                let d = (r * r + self.softening * self.softening).sqrt();
                if d > 0.0 {
                    potential -= self.gravitational_constant * self.masses[i] * self.masses[j] / d;
                }
            }
        }
        kinetic + potential
    }
}

impl OdeSystem for NBodySystem {
    fn dimension(&self) -> usize {
        self.masses.len() * BODY_STRIDE
    }

    fn rhs(&self, _t: f64, y: &[f64], dydt: &mut [f64]) {
        let accelerations = self.accelerations(y);
        for (i, a) in accelerations.iter().enumerate() {
            let base = i * BODY_STRIDE;
            if self.fixed == Some(i) {
                dydt[base..base + BODY_STRIDE].fill(0.0);
                continue;
            }
            dydt[base..base + 3].copy_from_slice(&y[base + 3..base + 6]);
            dydt[base + 3..base + 6].copy_from_slice(a);
        }
    }
}

/// Positions of externally advanced bodies captured before and after one engine step.
///
/// Sub-step queries interpolate linearly between the two snapshots, so a probe integrated
/// across that step sees a consistent, read-only gravity field.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenBodies {
    t_start: f64,
    dt: f64,
    masses: Vec<f64>,
    before: Vec<Vector3>,
    after: Vec<Vector3>,
}

impl FrozenBodies {
    pub fn new(
        t_start: f64,
        dt: f64,
        masses: Vec<f64>,
        before: Vec<Vector3>,
        after: Vec<Vector3>,
    ) -> Result<Self, DynamicsError> {
        if masses.len() != before.len() || before.len() != after.len() {
            return Err(DynamicsError::SnapshotMismatch {
                masses: masses.len(),
                before: before.len(),
                after: after.len(),
            });
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(DynamicsError::InvalidInterval(dt));
        }
        validate_masses(&masses)?;
        Ok(Self {
            t_start,
            dt,
            masses,
            before,
            after,
        })
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn t_start(&self) -> f64 {
        self.t_start
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Interpolated position of body `index` at `t`, clamped to the captured interval.
    pub fn position_at(&self, index: usize, t: f64) -> Vector3 {
        let s = ((t - self.t_start) / self.dt).clamp(0.0, 1.0);
        vector::lerp(&self.before[index], &self.after[index], s)
    }
}

/// Massless probe moving through a [`FrozenBodies`] field. State `[x, y, z, vx, vy, vz]`.
#[derive(Debug, Clone, Copy)]
pub struct ProbeGravity<'a> {
    field: &'a FrozenBodies,
    gravitational_constant: f64,
    softening: f64,
}

impl<'a> ProbeGravity<'a> {
    pub fn new(
        field: &'a FrozenBodies,
        gravitational_constant: f64,
        softening: f64,
    ) -> Result<Self, DynamicsError> {
        validate_softening(softening)?;
        if !(gravitational_constant.is_finite() && gravitational_constant > 0.0) {
            return Err(DynamicsError::InvalidGravitationalConstant(
                gravitational_constant,
            ));
        }
        Ok(Self {
            field,
            gravitational_constant,
            softening,
        })
    }
}

impl OdeSystem for ProbeGravity<'_> {
    fn dimension(&self) -> usize {
        BODY_STRIDE
    }

    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        let position = vector::from_slice(y, 0);
        let mut acceleration = vector::ZERO;
        for (index, &mass) in self.field.masses().iter().enumerate() {
            let r = vector::sub(&self.field.position_at(index, t), &position);
            let pull = softened_pull(self.gravitational_constant, mass, &r, self.softening);
            acceleration = vector::add(&acceleration, &pull);
        }
        dydt[..3].copy_from_slice(&y[3..6]);
        dydt[3..6].copy_from_slice(&acceleration);
    }
}
