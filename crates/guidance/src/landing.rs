//! Touchdown classification.

use descent_core::angle::normalize;
use descent_dynamics::LanderState;
use descent_ode::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandingOutcome {
    Airborne,
    SafeLanding,
    Crash,
}

impl LandingOutcome {
    pub fn is_safe(self) -> bool {
        self == LandingOutcome::SafeLanding
    }

    pub fn label(self) -> &'static str {
        match self {
            LandingOutcome::Airborne => "airborne",
            LandingOutcome::SafeLanding => "safe landing",
            LandingOutcome::Crash => "crash",
        }
    }
}

/// Bounds a grounded state must satisfy to count as a safe landing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandingTolerances {
    /// Horizontal distance from the target site (m).
    pub position: f64,
    /// Tilt from vertical (rad).
    pub attitude: f64,
    pub horizontal_speed: f64,
    pub vertical_speed: f64,
    pub angular_rate: f64,
}

impl Default for LandingTolerances {
    fn default() -> Self {
        Self {
            position: 20.0,
            attitude: 0.2,
            horizontal_speed: 2.0,
            vertical_speed: 2.0,
            angular_rate: 0.2,
        }
    }
}

/// Classify against an explicit altitude above terrain.
///
/// Any altitude that is not strictly positive (including NaN) is grounded, so the result is
/// then always either `SafeLanding` or `Crash`.
pub fn classify_with_altitude(
    state: &LanderState,
    altitude: f64,
    tolerances: &LandingTolerances,
) -> LandingOutcome {
    if altitude > 0.0 {
        return LandingOutcome::Airborne;
    }
    let safe = state.x.abs() <= tolerances.position
        && normalize(state.theta).abs() <= tolerances.attitude
        && state.vx.abs() <= tolerances.horizontal_speed
        && state.vy.abs() <= tolerances.vertical_speed
        && state.omega.abs() <= tolerances.angular_rate;
    if safe {
        LandingOutcome::SafeLanding
    } else {
        LandingOutcome::Crash
    }
}

/// Classify over flat ground at `y = 0`.
pub fn classify(state: &LanderState, tolerances: &LandingTolerances) -> LandingOutcome {
    classify_with_altitude(state, state.y, tolerances)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchdownReport {
    pub time: f64,
    pub state: LanderState,
    pub outcome: LandingOutcome,
    /// The run ended on its step limit rather than its stop condition.
    pub timed_out: bool,
}

/// Outcome at the final row of a lander trajectory over flat ground.
pub fn touchdown_report(trajectory: &Trajectory, tolerances: &LandingTolerances) -> TouchdownReport {
    let last = trajectory.last();
    let state = LanderState::from_slice(&last.state);
    TouchdownReport {
        time: last.t,
        state,
        outcome: classify(&state, tolerances),
        timed_out: trajectory.timed_out(),
    }
}
