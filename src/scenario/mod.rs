//! Conversion from configuration models into validated runtime values.

use std::path::Path;

use descent_config::{
    BodyConfig, ConfigError, ControllerConfig, DragConfig, GainsConfig, IntegratorConfig,
    IntegratorMethod, OptimizerConfig, PlanConfig, ScenarioConfig, TerrainConfig,
    TolerancesConfig, WindConfig,
};
use descent_core::ActuatorLimits;
use descent_dynamics::{
    AtmosphereProfile, Body, DragModel, DynamicsError, LanderParams, LanderState, NBodySystem,
    SyntheticEnvironment, TerrainModel, WindModel, pack_state,
};
use descent_guidance::{
    Controller, FeedbackController, FeedbackGains, GuidanceError, LandingTolerances,
    OpenLoopProfile, PlanOptions, plan_descent,
};
use descent_ode::{IntegrationError, Rkf45};
use descent_optimize::{Bounds, GeneticConfig, GradientConfig, OptimizeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid physical model: {0}")]
    Dynamics(#[from] DynamicsError),
    #[error("invalid controller: {0}")]
    Guidance(#[from] GuidanceError),
    #[error("invalid optimiser settings: {0}")]
    Optimize(#[from] OptimizeError),
    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),
    #[error("invalid scenario: {0}")]
    Invalid(String),
}

/// Which controller variant a scenario flies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    Feedback,
    OpenLoop,
    Combined,
}

impl ControllerKind {
    pub fn label(self) -> &'static str {
        match self {
            ControllerKind::Feedback => "feedback",
            ControllerKind::OpenLoop => "open-loop",
            ControllerKind::Combined => "combined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntegratorChoice {
    Rk4,
    Rkf45(Rkf45),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorSettings {
    pub choice: IntegratorChoice,
    /// Fixed step for RK4, initial trial step for RKF45 (s).
    pub step: f64,
    pub max_steps: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuningSettings {
    /// Box over `[kp_y, kd_y, kp_x, kd_x, kp_theta, kd_theta]`.
    pub gain_bounds: Bounds,
    pub genetic: GeneticConfig,
    pub gradient: GradientConfig,
}

/// Fully validated descent scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub params: LanderParams,
    pub initial_state: LanderState,
    pub drag: Option<DragModel>,
    pub environment: SyntheticEnvironment,
    pub controller: ControllerKind,
    /// Gains used by the feedback and combined controllers.
    pub gains: FeedbackGains,
    /// Plan options used by the open-loop and combined controllers.
    pub plan: PlanOptions,
    pub integrator: IntegratorSettings,
    pub tolerances: LandingTolerances,
    pub tuning: TuningSettings,
}

/// Load and validate a scenario file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, ScenarioError> {
    descent_config::load_scenario(path)?.try_into()
}

impl Scenario {
    /// The Titan reference descent: every configuration default.
    pub fn titan() -> Result<Self, ScenarioError> {
        ScenarioConfig::default().try_into()
    }

    /// Build a fresh controller of the configured kind. Open-loop plans start at `t = 0`
    /// from the scenario's initial state.
    pub fn build_controller(&self) -> Result<Controller, ScenarioError> {
        Ok(match self.controller {
            ControllerKind::Feedback => Controller::Feedback(self.feedback()?),
            ControllerKind::OpenLoop => Controller::OpenLoop(self.open_loop_profile()?),
            ControllerKind::Combined => {
                Controller::combined(self.open_loop_profile()?, self.feedback()?)
            }
        })
    }

    pub fn feedback(&self) -> Result<FeedbackController, ScenarioError> {
        self.feedback_with(self.gains)
    }

    pub fn feedback_with(&self, gains: FeedbackGains) -> Result<FeedbackController, ScenarioError> {
        Ok(FeedbackController::new(
            gains,
            self.params.gravity,
            self.params.limits,
        )?)
    }

    pub fn open_loop_profile(&self) -> Result<OpenLoopProfile, ScenarioError> {
        Ok(plan_descent(
            0.0,
            &self.initial_state,
            self.params.gravity,
            self.params.limits,
            &self.plan,
        )?)
    }
}

impl TryFrom<ScenarioConfig> for Scenario {
    type Error = ScenarioError;

    fn try_from(value: ScenarioConfig) -> Result<Self, Self::Error> {
        let lander = &value.lander;
        let mut params = LanderParams::new(
            lander.gravity_m_s2,
            lander.mass_kg,
            ActuatorLimits::new(lander.max_thrust_m_s2, lander.max_torque_rad_s2),
        );
        params.ground_epsilon = lander.ground_epsilon_m;
        params.validate()?;

        let state = value.initial_state.to_array();
        if state.iter().any(|v| !v.is_finite()) {
            return Err(ScenarioError::Invalid(
                "initial state must be finite".to_string(),
            ));
        }

        let drag = value.drag.as_ref().map(drag_model).transpose()?;
        let environment = SyntheticEnvironment::new(
            terrain_model(&value.environment.terrain)?,
            wind_model(&value.environment.wind)?,
        );

        let (controller, gains, plan) = match &value.controller {
            ControllerConfig::Feedback { gains } => {
                (ControllerKind::Feedback, gains.clone(), PlanConfig::default())
            }
            ControllerConfig::OpenLoop { plan } => {
                (ControllerKind::OpenLoop, GainsConfig::default(), plan.clone())
            }
            ControllerConfig::Combined { gains, plan } => {
                (ControllerKind::Combined, gains.clone(), plan.clone())
            }
        };

        let scenario = Scenario {
            name: value.name.clone(),
            params,
            initial_state: LanderState::from_slice(&state),
            drag,
            environment,
            controller,
            gains: FeedbackGains::from_slice(&gains.to_array())?,
            plan: PlanOptions {
                resolution: plan.resolution_s,
                tilt: plan.tilt_rad,
                target_time: plan.target_time_s,
            },
            integrator: integrator_settings(&value.integrator)?,
            tolerances: tolerances(&value.tolerances)?,
            tuning: tuning_settings(&value.optimizer)?,
        };
        // Surface gain and plan errors at load time rather than mid-run.
        scenario.build_controller()?;
        Ok(scenario)
    }
}

fn drag_model(config: &DragConfig) -> Result<DragModel, DynamicsError> {
    let model = match &config.aerodynamics {
        Some(aero) => DragModel::from_aerodynamics(
            aero.density_kg_m3,
            aero.drag_coefficient,
            aero.area_m2,
            config.ceiling_m,
        )?,
        None => DragModel::new(config.coefficient_kg_m, config.ceiling_m)?,
    };
    match config.scale_height_m {
        Some(scale_height) => model.with_atmosphere(AtmosphereProfile::Exponential { scale_height }),
        None => Ok(model),
    }
}

fn terrain_model(config: &TerrainConfig) -> Result<TerrainModel, DynamicsError> {
    match *config {
        TerrainConfig::Flat { height_m } => Ok(TerrainModel::flat(height_m)),
        TerrainConfig::Noise {
            base_height_m,
            amplitude_m,
            wavelength_m,
            seed,
        } => TerrainModel::noise(base_height_m, amplitude_m, wavelength_m, seed),
    }
}

fn wind_model(config: &WindConfig) -> Result<WindModel, DynamicsError> {
    match *config {
        WindConfig::Calm => Ok(WindModel::Calm),
        WindConfig::Constant { velocity_m_s } => Ok(WindModel::constant(velocity_m_s)),
        WindConfig::Noise {
            mean_m_s,
            amplitude_m_s,
            wavelength_m,
            seed,
        } => WindModel::noise(mean_m_s, amplitude_m_s, wavelength_m, seed),
    }
}

fn integrator_settings(config: &IntegratorConfig) -> Result<IntegratorSettings, ScenarioError> {
    if !(config.step_s.is_finite() && config.step_s > 0.0) {
        return Err(IntegrationError::InvalidStepSize(config.step_s).into());
    }
    if config.max_steps == 0 {
        return Err(IntegrationError::InvalidMaxSteps.into());
    }
    let choice = match config.method {
        IntegratorMethod::Rk4 => IntegratorChoice::Rk4,
        IntegratorMethod::Rkf45 => {
            if !(config.tolerance.is_finite() && config.tolerance > 0.0) {
                return Err(IntegrationError::InvalidTolerance(config.tolerance).into());
            }
            let mut solver = Rkf45::new(config.tolerance);
            if let Some(max_step) = config.max_step_s {
                solver = solver.with_max_step(max_step);
            }
            IntegratorChoice::Rkf45(solver)
        }
    };
    Ok(IntegratorSettings {
        choice,
        step: config.step_s,
        max_steps: config.max_steps,
    })
}

fn tolerances(config: &TolerancesConfig) -> Result<LandingTolerances, ScenarioError> {
    let tolerances = LandingTolerances {
        position: config.position_m,
        attitude: config.attitude_rad,
        horizontal_speed: config.horizontal_speed_m_s,
        vertical_speed: config.vertical_speed_m_s,
        angular_rate: config.angular_rate_rad_s,
    };
    let all = [
        tolerances.position,
        tolerances.attitude,
        tolerances.horizontal_speed,
        tolerances.vertical_speed,
        tolerances.angular_rate,
    ];
    if all.iter().any(|t| !(t.is_finite() && *t > 0.0)) {
        return Err(ScenarioError::Invalid(
            "landing tolerances must be positive and finite".to_string(),
        ));
    }
    Ok(tolerances)
}

fn tuning_settings(config: &OptimizerConfig) -> Result<TuningSettings, ScenarioError> {
    if config.gain_bounds.len() != FeedbackGains::COUNT {
        return Err(ScenarioError::Invalid(format!(
            "expected {} gain bounds, got {}",
            FeedbackGains::COUNT,
            config.gain_bounds.len()
        )));
    }
    let gain_bounds = Bounds::new(
        config
            .gain_bounds
            .iter()
            .map(|&[lower, upper]| (lower, upper))
            .collect(),
    )?;
    let genetic = &config.genetic;
    let gradient = &config.gradient;
    Ok(TuningSettings {
        gain_bounds,
        genetic: GeneticConfig {
            population_size: genetic.population_size,
            generations: genetic.generations,
            elite_count: genetic.elite_count,
            tournament_size: genetic.tournament_size,
            crossover_rate: genetic.crossover_rate,
            blend_alpha: genetic.blend_alpha,
            mutation_rate: genetic.mutation_rate,
            mutation_scale: genetic.mutation_scale,
            seed: genetic.seed,
        },
        gradient: GradientConfig {
            learning_rate: gradient.learning_rate,
            finite_difference_step: gradient.finite_difference_step,
            max_iterations: gradient.max_iterations,
            tolerance: gradient.tolerance,
            max_backtracks: gradient.max_backtracks,
        },
    })
}

/// Body catalog ready for propagation.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub bodies: Vec<Body>,
    /// Index of the body pinned in place, if any.
    pub fixed: Option<usize>,
}

/// Load and validate a body catalog (YAML list, TOML file or directory of TOML files).
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog, ScenarioError> {
    descent_config::load_bodies(path)?.try_into()
}

impl TryFrom<Vec<BodyConfig>> for Catalog {
    type Error = ScenarioError;

    fn try_from(value: Vec<BodyConfig>) -> Result<Self, Self::Error> {
        let mut fixed = None;
        for (index, body) in value.iter().enumerate() {
            if body.fixed {
                if fixed.is_some() {
                    return Err(ScenarioError::Invalid(format!(
                        "only one body may be fixed; `{}` is the second",
                        body.name
                    )));
                }
                fixed = Some(index);
            }
        }
        let bodies = value
            .into_iter()
            .map(|body| Body::new(body.name, body.mass_kg, body.position_m, body.velocity_m_s))
            .collect();
        Ok(Self { bodies, fixed })
    }
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Case-insensitive lookup by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.bodies
            .iter()
            .position(|body| body.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.bodies.iter().map(|body| body.name.as_str()).collect()
    }

    /// Packed `[r, v]` state of every body.
    pub fn state(&self) -> Vec<f64> {
        pack_state(&self.bodies)
    }

    pub fn system(&self, softening: f64) -> Result<NBodySystem, DynamicsError> {
        let system = NBodySystem::from_bodies(&self.bodies, softening)?;
        match self.fixed {
            Some(index) => system.with_fixed_body(index),
            None => Ok(system),
        }
    }
}
