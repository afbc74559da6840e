//! Body-catalog propagation, probe flights through an externally stepped engine, and the
//! transfer-targeting fitness problem.

use descent_core::time::days_to_seconds;
use descent_core::vector::{self, Vector3};
use descent_dynamics::nbody::separation;
use descent_dynamics::{
    BODY_STRIDE, Body, DynamicsError, FrozenBodies, PhysicsEngine, ProbeGravity,
};
use descent_ode::{IntegrationError, Integrator, Rkf45, Trajectory, rk4_step};
use descent_optimize::{Evaluation, FitnessFunction, TrajectorySummary};

use crate::scenario::Catalog;

/// Top-level propagation error.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("invalid body model: {0}")]
    Dynamics(#[from] DynamicsError),
    #[error("propagation failed: {0}")]
    Integration(#[from] IntegrationError),
    #[error("body `{0}` not found in catalog")]
    UnknownBody(String),
    #[error("body index {index} out of range for {count} bodies")]
    BodyIndex { index: usize, count: usize },
    #[error("expected a 3-component Δv, got {0} components")]
    DeltaVDimension(usize),
    #[error("invalid propagation settings: {0}")]
    InvalidSettings(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagationSettings {
    /// Propagation span (s). The run ends on the first accepted step at or past it.
    pub duration: f64,
    /// First RKF45 trial step (s).
    pub initial_step: f64,
    /// Absolute RKF45 tolerance on positions (m) and velocities (m/s).
    pub tolerance: f64,
    pub max_step: Option<f64>,
    pub max_steps: usize,
    /// Gravitational softening length (m).
    pub softening: f64,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            duration: days_to_seconds(365.0),
            initial_step: 3_600.0,
            tolerance: 10.0,
            max_step: Some(days_to_seconds(2.0)),
            max_steps: 200_000,
            softening: 0.0,
        }
    }
}

impl PropagationSettings {
    pub fn days(days: f64) -> Self {
        Self {
            duration: days_to_seconds(days),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), MissionError> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(MissionError::InvalidSettings(
                "duration must be positive and finite",
            ));
        }
        Ok(())
    }

    fn solver(&self) -> Rkf45 {
        let solver = Rkf45::new(self.tolerance);
        match self.max_step {
            Some(max_step) => solver.with_max_step(max_step),
            None => solver,
        }
    }
}

/// Propagate every body of the catalog with RKF45 over the settings' duration.
pub fn propagate_system(
    catalog: &Catalog,
    settings: &PropagationSettings,
) -> Result<Trajectory, MissionError> {
    settings.validate()?;
    let system = catalog.system(settings.softening)?;
    let duration = settings.duration;
    let elapsed = move |t: f64, _y: &[f64]| t >= duration;
    Ok(settings.solver().solve(
        &system,
        0.0,
        &catalog.state(),
        settings.initial_step,
        settings.max_steps,
        Some(&elapsed),
    )?)
}

/// Resolve a body name (case-insensitive) to its catalog index.
pub fn body_index(catalog: &Catalog, name: &str) -> Result<usize, MissionError> {
    catalog
        .index_of(name)
        .ok_or_else(|| MissionError::UnknownBody(name.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestApproach {
    pub t: f64,
    pub distance: f64,
}

/// Smallest sampled separation between bodies `a` and `b` of a packed N-body trajectory.
pub fn closest_approach(
    trajectory: &Trajectory,
    a: usize,
    b: usize,
) -> Result<ClosestApproach, MissionError> {
    let count = trajectory.initial().state.len() / BODY_STRIDE;
    for index in [a, b] {
        if index >= count {
            return Err(MissionError::BodyIndex { index, count });
        }
    }
    let mut best = ClosestApproach {
        t: trajectory.initial().t,
        distance: f64::INFINITY,
    };
    for row in trajectory.rows() {
        let distance = separation(&row.state, a, b);
        if distance < best.distance {
            best = ClosestApproach { t: row.t, distance };
        }
    }
    Ok(best)
}

/// Fly a massless probe alongside `engine`: each step advances the engine once, then takes one
/// RK4 step of the probe through the interpolated body field of that engine step.
///
/// Returns `steps + 1` samples starting at the engine's current time.
pub fn propagate_probe(
    engine: &mut PhysicsEngine,
    probe: [f64; 6],
    dt: f64,
    steps: usize,
) -> Result<Vec<(f64, [f64; 6])>, MissionError> {
    let mut t = engine.time();
    let mut state = probe;
    let mut samples = Vec::with_capacity(steps + 1);
    samples.push((t, state));
    for _ in 0..steps {
        let field = FrozenBodies::from_engine_step(engine, dt)?;
        let gravity = ProbeGravity::new(&field, engine.gravitational_constant(), engine.softening())?;
        let next = rk4_step(&gravity, t, &state, dt);
        state.copy_from_slice(&next);
        t = engine.time();
        samples.push((t, state));
    }
    Ok(samples)
}

/// Mass given to the probe when it is propagated as a catalog body.
pub const PROBE_MASS_KG: f64 = 1.0;

/// Δv at departure in, minimum probe-target distance out.
///
/// The probe starts at the origin body's position plus `departure_offset`, with the origin's
/// velocity plus the Δv genes, and is propagated with every catalog body.
#[derive(Debug, Clone)]
pub struct TransferProblem {
    catalog: Catalog,
    origin: usize,
    target: usize,
    departure_offset: Vector3,
    settings: PropagationSettings,
}

impl TransferProblem {
    pub fn new(
        catalog: Catalog,
        origin: &str,
        target: &str,
        settings: PropagationSettings,
    ) -> Result<Self, MissionError> {
        settings.validate()?;
        let origin = body_index(&catalog, origin)?;
        let target = body_index(&catalog, target)?;
        Ok(Self {
            catalog,
            origin,
            target,
            departure_offset: [5.0e8, 0.0, 0.0],
            settings,
        })
    }

    pub fn with_departure_offset(mut self, offset: Vector3) -> Self {
        self.departure_offset = offset;
        self
    }

    pub fn settings(&self) -> &PropagationSettings {
        &self.settings
    }

    /// Catalog extended with the probe as its last body.
    pub fn probe_catalog(&self, delta_v: &[f64]) -> Result<Catalog, MissionError> {
        let &[dvx, dvy, dvz] = delta_v else {
            return Err(MissionError::DeltaVDimension(delta_v.len()));
        };
        let origin = &self.catalog.bodies[self.origin];
        let probe = Body::new(
            "probe",
            PROBE_MASS_KG,
            vector::add(&origin.position, &self.departure_offset),
            vector::add(&origin.velocity, &[dvx, dvy, dvz]),
        );
        let mut catalog = self.catalog.clone();
        catalog.bodies.push(probe);
        Ok(catalog)
    }

    /// Propagate the probe for one Δv and report its closest approach to the target.
    pub fn fly(&self, delta_v: &[f64]) -> Result<(Trajectory, ClosestApproach), MissionError> {
        let catalog = self.probe_catalog(delta_v)?;
        let trajectory = propagate_system(&catalog, &self.settings)?;
        let approach = closest_approach(&trajectory, catalog.len() - 1, self.target)?;
        Ok((trajectory, approach))
    }
}

impl FitnessFunction for TransferProblem {
    fn evaluate(&self, genes: &[f64]) -> Evaluation {
        match self.fly(genes) {
            Ok((trajectory, approach)) => Evaluation::with_summary(
                approach.distance,
                TrajectorySummary {
                    final_time: trajectory.last().t,
                    steps: trajectory.steps(),
                    timed_out: trajectory.timed_out(),
                    min_distance: Some(approach.distance),
                    touchdown_speed: None,
                },
            ),
            Err(_) => Evaluation::new(f64::INFINITY),
        }
    }
}
