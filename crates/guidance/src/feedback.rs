//! Cascaded PD feedback: altitude sets thrust, horizontal error sets a desired tilt, and the
//! attitude loop tracks that tilt with torque.

use descent_core::angle::normalize;
use descent_core::{ActuatorLimits, Command};
use descent_dynamics::LanderState;

use crate::GuidanceError;

/// Thrust below which the tilt law falls back to holding the vehicle upright (m/s²).
pub const ZERO_THRUST_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackGains {
    pub kp_y: f64,
    pub kd_y: f64,
    pub kp_x: f64,
    pub kd_x: f64,
    pub kp_theta: f64,
    pub kd_theta: f64,
}

impl Default for FeedbackGains {
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

impl FeedbackGains {
    pub const COUNT: usize = 6;

    /// Gains in `[kp_y, kd_y, kp_x, kd_x, kp_theta, kd_theta]` order.
    pub fn to_array(&self) -> [f64; Self::COUNT] {
        [
            self.kp_y,
            self.kd_y,
            self.kp_x,
            self.kd_x,
            self.kp_theta,
            self.kd_theta,
        ]
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, GuidanceError> {
        match values {
            &[kp_y, kd_y, kp_x, kd_x, kp_theta, kd_theta] => Ok(Self {
                kp_y,
                kd_y,
                kp_x,
                kd_x,
                kp_theta,
                kd_theta,
            }),
            _ => Err(GuidanceError::GainCount {
                expected: Self::COUNT,
                actual: values.len(),
            }),
        }
    }

    fn validate(&self) -> Result<(), GuidanceError> {
        let named = [
            ("kp_y", self.kp_y),
            ("kd_y", self.kd_y),
            ("kp_x", self.kp_x),
            ("kd_x", self.kd_x),
            ("kp_theta", self.kp_theta),
            ("kd_theta", self.kd_theta),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(GuidanceError::InvalidGain(name));
            }
        }
        Ok(())
    }
}

/// Cascaded PD law. Only built through [`FeedbackController::new`], so its limits are valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackController {
    gains: FeedbackGains,
    /// Hover feed-forward thrust, equal to surface gravity for a unit-mass thrust command.
    gravity: f64,
    limits: ActuatorLimits,
}

impl FeedbackController {
    pub fn new(
        gains: FeedbackGains,
        gravity: f64,
        limits: ActuatorLimits,
    ) -> Result<Self, GuidanceError> {
        gains.validate()?;
        if !(gravity.is_finite() && gravity >= 0.0) {
            return Err(GuidanceError::InvalidGravity(gravity));
        }
        if !limits.is_valid() {
            return Err(GuidanceError::InvalidLimits);
        }
        Ok(Self {
            gains,
            gravity,
            limits,
        })
    }

    pub fn gains(&self) -> &FeedbackGains {
        &self.gains
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    pub fn limits(&self) -> ActuatorLimits {
        self.limits
    }

    /// Vertical law `g - kp_y * y - kd_y * ẏ` before saturation.
    pub fn raw_thrust(&self, state: &LanderState) -> f64 {
        let g = &self.gains;
        self.gravity - g.kp_y * state.y - g.kd_y * state.vy
    }

    /// Vertical law clamped to the thrust range.
    pub fn thrust(&self, state: &LanderState) -> f64 {
        self.limits.clamp_thrust(self.raw_thrust(state))
    }

    /// Tilt that points the current thrust against the horizontal error.
    ///
    /// Upright when the thrust is (near) zero, since no tilt can then produce lateral force.
    pub fn desired_tilt(&self, state: &LanderState, thrust: f64) -> f64 {
        if thrust.abs() < ZERO_THRUST_EPSILON {
            return 0.0;
        }
        let g = &self.gains;
        let lateral = -g.kp_x * state.x - g.kd_x * state.vx;
        (lateral / thrust).clamp(-1.0, 1.0).asin()
    }

    /// Attitude law before torque saturation.
    pub fn raw_torque(&self, state: &LanderState, desired_tilt: f64) -> f64 {
        let g = &self.gains;
        -g.kp_theta * normalize(state.theta - desired_tilt) - g.kd_theta * state.omega
    }

    /// Unsaturated command, for summing with a feed-forward term before saturation.
    ///
    /// The tilt loop still divides by the clamped thrust: only thrust the engine can
    /// deliver produces lateral acceleration.
    pub fn contribution(&self, state: &LanderState) -> Command {
        let tilt = self.desired_tilt(state, self.thrust(state));
        Command::new(self.raw_thrust(state), self.raw_torque(state, tilt))
    }

    pub fn evaluate(&self, state: &LanderState) -> Command {
        self.limits.saturate(self.contribution(state))
    }
}
