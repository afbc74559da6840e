//! Fixed-step velocity-Verlet engine for the bodies a probe flies among.
//!
//! The engine owns its bodies and advances them in place. Probes never read the body list
//! directly; [`FrozenBodies::from_engine_step`] captures positions around one engine step and
//! hands the probe an interpolated, read-only field instead.

use descent_core::constants::G;
use descent_core::vector::{self, Vector3};

use crate::DynamicsError;
use crate::nbody::{Body, FrozenBodies, pairwise_accelerations, validate_masses, validate_softening};

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsEngine {
    bodies: Vec<Body>,
    gravitational_constant: f64,
    softening: f64,
    time: f64,
}

impl PhysicsEngine {
    pub fn new(gravitational_constant: f64, softening: f64) -> Result<Self, DynamicsError> {
        if !(gravitational_constant.is_finite() && gravitational_constant > 0.0) {
            return Err(DynamicsError::InvalidGravitationalConstant(
                gravitational_constant,
            ));
        }
        validate_softening(softening)?;
        Ok(Self {
            bodies: Vec::new(),
            gravitational_constant,
            softening,
            time: 0.0,
        })
    }

    /// Engine using the SI gravitational constant.
    pub fn newtonian(softening: f64) -> Result<Self, DynamicsError> {
        Self::new(G, softening)
    }

    /// Add a body and return its index.
    pub fn add_body(&mut self, body: Body) -> Result<usize, DynamicsError> {
        let index = self.bodies.len();
        if !(body.mass.is_finite() && body.mass > 0.0) {
            return Err(DynamicsError::InvalidMass {
                index,
                mass: body.mass,
            });
        }
        self.bodies.push(body);
        Ok(index)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn gravitational_constant(&self) -> f64 {
        self.gravitational_constant
    }

    pub fn softening(&self) -> f64 {
        self.softening
    }

    pub fn masses(&self) -> Vec<f64> {
        self.bodies.iter().map(|b| b.mass).collect()
    }

    pub fn positions(&self) -> Vec<Vector3> {
        self.bodies.iter().map(|b| b.position).collect()
    }

    /// Acceleration of every body at the current positions.
    pub fn accelerations(&self) -> Vec<Vector3> {
        pairwise_accelerations(
            self.gravitational_constant,
            self.softening,
            &self.masses(),
            &self.positions(),
        )
    }

    /// Kick-drift-kick velocity-Verlet step of length `dt`.
    pub fn step(&mut self, dt: f64) -> Result<(), DynamicsError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(DynamicsError::InvalidInterval(dt));
        }
        let half_dt = 0.5 * dt;

        let a_old = self.accelerations();
        for (body, a) in self.bodies.iter_mut().zip(&a_old) {
            body.velocity = vector::add(&body.velocity, &vector::scale(a, half_dt));
            body.position = vector::add(&body.position, &vector::scale(&body.velocity, dt));
        }
        self.time += dt;

        let a_new = self.accelerations();
        for (body, a) in self.bodies.iter_mut().zip(&a_new) {
            body.velocity = vector::add(&body.velocity, &vector::scale(a, half_dt));
        }
        Ok(())
    }
}

impl FrozenBodies {
    /// Advance `engine` by `dt`, returning the before/after snapshot of that step.
    pub fn from_engine_step(engine: &mut PhysicsEngine, dt: f64) -> Result<Self, DynamicsError> {
        let masses = engine.masses();
        validate_masses(&masses)?;
        let t_start = engine.time();
        let before = engine.positions();
        engine.step(dt)?;
        let after = engine.positions();
        FrozenBodies::new(t_start, dt, masses, before, after)
    }
}
