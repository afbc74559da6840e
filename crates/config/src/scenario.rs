//! Descent scenario models. Every field has a default, so a scenario file only needs to
//! name what differs from the Titan reference descent.

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    pub lander: LanderConfig,
    pub initial_state: InitialStateConfig,
    /// `null` disables drag entirely.
    pub drag: Option<DragConfig>,
    pub environment: EnvironmentConfig,
    pub controller: ControllerConfig,
    pub integrator: IntegratorConfig,
    pub tolerances: TolerancesConfig,
    pub optimizer: OptimizerConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "titan-descent".to_string(),
            lander: LanderConfig::default(),
            initial_state: InitialStateConfig::default(),
            drag: Some(DragConfig::default()),
            environment: EnvironmentConfig::default(),
            controller: ControllerConfig::default(),
            integrator: IntegratorConfig::default(),
            tolerances: TolerancesConfig::default(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LanderConfig {
    pub gravity_m_s2: f64,
    pub mass_kg: f64,
    /// Thrust authority as an acceleration.
    pub max_thrust_m_s2: f64,
    /// Torque authority as an angular acceleration.
    pub max_torque_rad_s2: f64,
    pub ground_epsilon_m: f64,
}

impl Default for LanderConfig {
    fn default() -> Self {
        Self {
            gravity_m_s2: 1.352,
            mass_kg: 1000.0,
            max_thrust_m_s2: 4.0,
            max_torque_rad_s2: 0.5,
            ground_epsilon_m: 1e-3,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct InitialStateConfig {
    pub x_m: f64,
    pub y_m: f64,
    pub theta_rad: f64,
    pub vx_m_s: f64,
    pub vy_m_s: f64,
    pub omega_rad_s: f64,
}

impl Default for InitialStateConfig {
    fn default() -> Self {
        Self {
            x_m: 0.0,
            y_m: 1500.0,
            theta_rad: 0.0,
            vx_m_s: 1.487,
            vy_m_s: 0.0,
            omega_rad_s: 0.0,
        }
    }
}

impl InitialStateConfig {
    /// State in `[x, y, θ, ẋ, ẏ, θ̇]` order.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.x_m,
            self.y_m,
            self.theta_rad,
            self.vx_m_s,
            self.vy_m_s,
            self.omega_rad_s,
        ]
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DragConfig {
    pub coefficient_kg_m: f64,
    pub ceiling_m: f64,
    /// Exponential density fall-off; uniform density when absent.
    pub scale_height_m: Option<f64>,
    /// Derive the coefficient from `½ ρ C_d A` instead of `coefficient_kg_m`.
    pub aerodynamics: Option<AerodynamicsConfig>,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            coefficient_kg_m: 13.5,
            ceiling_m: 10_000.0,
            scale_height_m: None,
            aerodynamics: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AerodynamicsConfig {
    pub density_kg_m3: f64,
    pub drag_coefficient: f64,
    pub area_m2: f64,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub terrain: TerrainConfig,
    pub wind: WindConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TerrainConfig {
    Flat {
        #[serde(default)]
        height_m: f64,
    },
    Noise {
        #[serde(default)]
        base_height_m: f64,
        amplitude_m: f64,
        wavelength_m: f64,
        #[serde(default)]
        seed: u64,
    },
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig::Flat { height_m: 0.0 }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WindConfig {
    #[default]
    Calm,
    Constant {
        velocity_m_s: [f64; 3],
    },
    Noise {
        #[serde(default)]
        mean_m_s: [f64; 3],
        amplitude_m_s: f64,
        wavelength_m: f64,
        #[serde(default)]
        seed: u64,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControllerConfig {
    Feedback {
        #[serde(default)]
        gains: GainsConfig,
    },
    OpenLoop {
        #[serde(default)]
        plan: PlanConfig,
    },
    Combined {
        #[serde(default)]
        gains: GainsConfig,
        #[serde(default)]
        plan: PlanConfig,
    },
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig::Feedback {
            gains: GainsConfig::default(),
        }
    }
}

impl ControllerConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            ControllerConfig::Feedback { .. } => "feedback",
            ControllerConfig::OpenLoop { .. } => "open-loop",
            ControllerConfig::Combined { .. } => "combined",
        }
    }

    pub fn gains(&self) -> Option<&GainsConfig> {
        match self {
            ControllerConfig::Feedback { gains } | ControllerConfig::Combined { gains, .. } => {
                Some(gains)
            }
            ControllerConfig::OpenLoop { .. } => None,
        }
    }

    pub fn plan(&self) -> Option<&PlanConfig> {
        match self {
            ControllerConfig::OpenLoop { plan } | ControllerConfig::Combined { plan, .. } => {
                Some(plan)
            }
            ControllerConfig::Feedback { .. } => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GainsConfig {
    pub kp_y: f64,
    pub kd_y: f64,
    pub kp_x: f64,
    pub kd_x: f64,
    pub kp_theta: f64,
    pub kd_theta: f64,
}

impl Default for GainsConfig {
    fn default() -> Self {
        Self {
            kp_y: 0.0001,
            kd_y: 0.00005,
            kp_x: 0.0005,
            kd_x: 0.0002,
            kp_theta: 10.0,
            kd_theta: 5.0,
        }
    }
}

impl GainsConfig {
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.kp_y,
            self.kd_y,
            self.kp_x,
            self.kd_x,
            self.kp_theta,
            self.kd_theta,
        ]
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlanConfig {
    pub resolution_s: f64,
    pub tilt_rad: f64,
    pub target_time_s: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            resolution_s: 0.1,
            tilt_rad: 0.25,
            target_time_s: 120.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IntegratorMethod {
    #[default]
    Rk4,
    Rkf45,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IntegratorConfig {
    pub method: IntegratorMethod,
    /// Fixed step for RK4, initial step for RKF45.
    pub step_s: f64,
    pub max_steps: usize,
    /// RKF45 error tolerance; ignored by RK4.
    pub tolerance: f64,
    /// RKF45 step cap.
    pub max_step_s: Option<f64>,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            method: IntegratorMethod::Rk4,
            step_s: 1.0,
            max_steps: 5000,
            tolerance: 1e-6,
            max_step_s: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TolerancesConfig {
    pub position_m: f64,
    pub attitude_rad: f64,
    pub horizontal_speed_m_s: f64,
    pub vertical_speed_m_s: f64,
    pub angular_rate_rad_s: f64,
}

impl Default for TolerancesConfig {
    fn default() -> Self {
        Self {
            position_m: 20.0,
            attitude_rad: 0.2,
            horizontal_speed_m_s: 2.0,
            vertical_speed_m_s: 2.0,
            angular_rate_rad_s: 0.2,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    /// `[lower, upper]` per gain, in `[kp_y, kd_y, kp_x, kd_x, kp_theta, kd_theta]` order.
    pub gain_bounds: Vec<[f64; 2]>,
    pub genetic: GeneticSettings,
    pub gradient: GradientSettings,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            gain_bounds: vec![
                [0.0, 0.0005],
                [0.0, 0.00025],
                [0.0, 0.0025],
                [0.0, 0.001],
                [1.0, 20.0],
                [0.5, 10.0],
            ],
            genetic: GeneticSettings::default(),
            gradient: GradientSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeneticSettings {
    pub population_size: usize,
    pub generations: usize,
    pub elite_count: usize,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub blend_alpha: f64,
    pub mutation_rate: f64,
    pub mutation_scale: f64,
    pub seed: u64,
}

impl Default for GeneticSettings {
    fn default() -> Self {
        Self {
            population_size: 24,
            generations: 10,
            elite_count: 2,
            tournament_size: 3,
            crossover_rate: 0.9,
            blend_alpha: 0.5,
            mutation_rate: 0.2,
            mutation_scale: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GradientSettings {
    pub learning_rate: f64,
    pub finite_difference_step: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub max_backtracks: usize,
}

impl Default for GradientSettings {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            finite_difference_step: 1e-3,
            max_iterations: 20,
            tolerance: 1e-8,
            max_backtracks: 10,
        }
    }
}
