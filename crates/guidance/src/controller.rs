use descent_core::{ActuatorLimits, Command};
use descent_dynamics::{CommandSource, LanderState};

use crate::feedback::FeedbackController;
use crate::open_loop::OpenLoopProfile;

/// Feed-forward table plus unsaturated feedback, saturated once after summation.
///
/// The limits come from the validated feedback controller, so saturation never sees an
/// inverted range.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedController {
    feedforward: OpenLoopProfile,
    feedback: FeedbackController,
}

impl CombinedController {
    pub fn new(feedforward: OpenLoopProfile, feedback: FeedbackController) -> Self {
        Self {
            feedforward,
            feedback,
        }
    }

    pub fn feedforward(&self) -> &OpenLoopProfile {
        &self.feedforward
    }

    pub fn feedback(&self) -> &FeedbackController {
        &self.feedback
    }

    pub fn limits(&self) -> ActuatorLimits {
        self.feedback.limits()
    }

    pub fn evaluate(&self, t: f64, state: &LanderState) -> Command {
        let ff = self.feedforward.lookup(t);
        let fb = self.feedback.contribution(state);
        self.limits()
            .saturate(Command::new(ff.thrust + fb.thrust, ff.torque + fb.torque))
    }
}

/// Lander controller as a closed set of variants dispatched by `match`.
#[derive(Debug, Clone, PartialEq)]
pub enum Controller {
    /// Tabulated feed-forward commands.
    OpenLoop(OpenLoopProfile),
    /// Cascaded PD feedback on the current state.
    Feedback(FeedbackController),
    Combined(CombinedController),
}

impl Controller {
    /// Combined controller saturating to the feedback controller's limits.
    pub fn combined(feedforward: OpenLoopProfile, feedback: FeedbackController) -> Self {
        Controller::Combined(CombinedController::new(feedforward, feedback))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Controller::OpenLoop(_) => "open-loop",
            Controller::Feedback(_) => "feedback",
            Controller::Combined(_) => "combined",
        }
    }

    /// Thrust and torque for `state` (layout `[x, y, θ, ẋ, ẏ, θ̇]`) at time `t`.
    pub fn evaluate(&self, t: f64, state: &[f64]) -> Command {
        match self {
            Controller::OpenLoop(profile) => profile.lookup(t),
            Controller::Feedback(feedback) => feedback.evaluate(&LanderState::from_slice(state)),
            Controller::Combined(combined) => combined.evaluate(t, &LanderState::from_slice(state)),
        }
    }
}

impl CommandSource for Controller {
    fn command(&self, t: f64, state: &[f64]) -> Command {
        self.evaluate(t, state)
    }
}
