//! Lander descent runs and the gain-tuning fitness problem.

use descent_core::angle::normalize;
use descent_dynamics::{
    CommandSource, Environment, LanderDiagnostics, LanderModel, LanderState, SyntheticEnvironment,
};
use descent_guidance::{
    Controller, FeedbackGains, LandingOutcome, LandingTolerances, OpenLoopProfile,
    TouchdownReport, classify_with_altitude,
};
use descent_ode::{Integrator, Rk4, Trajectory};
use descent_optimize::{
    Evaluation, FitnessFunction, GeneticAlgorithm, GeneticConfig, GradientDescent,
    TrajectorySummary,
};

use crate::scenario::{ControllerKind, IntegratorChoice, Scenario, ScenarioError};

/// Added to the landing cost when the run hits its step limit before touching down.
pub const TIMEOUT_PENALTY: f64 = 1_000.0;
/// Added to the landing cost of a crash.
pub const CRASH_PENALTY: f64 = 10.0;

/// Everything recorded about one descent.
#[derive(Debug, Clone, PartialEq)]
pub struct DescentReport {
    pub controller: &'static str,
    pub trajectory: Trajectory,
    /// Command, drag and ground-contact state at every trajectory row.
    pub diagnostics: Vec<LanderDiagnostics>,
    pub touchdown: TouchdownReport,
}

impl DescentReport {
    pub fn steps(&self) -> usize {
        self.trajectory.steps()
    }

    pub fn outcome(&self) -> LandingOutcome {
        self.touchdown.outcome
    }
}

/// A trajectory and its classified end point.
#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    pub trajectory: Trajectory,
    pub touchdown: TouchdownReport,
}

/// Fly the scenario with its configured controller until the lander reaches the terrain or
/// the step limit.
pub fn simulate_descent(scenario: &Scenario) -> Result<DescentReport, ScenarioError> {
    let controller = scenario.build_controller()?;
    let model = lander_model(scenario, &controller)?;
    let trajectory = integrate(scenario, &model)?;
    let diagnostics = model.diagnostics_along(&trajectory);
    let touchdown = classify_touchdown(&trajectory, &scenario.environment, &scenario.tolerances);
    Ok(DescentReport {
        controller: controller.name(),
        trajectory,
        diagnostics,
        touchdown,
    })
}

/// Fly the scenario with an arbitrary command source in place of its own controller.
pub fn fly<C: CommandSource + ?Sized>(
    scenario: &Scenario,
    controller: &C,
) -> Result<Flight, ScenarioError> {
    let model = lander_model(scenario, controller)?;
    let trajectory = integrate(scenario, &model)?;
    let touchdown = classify_touchdown(&trajectory, &scenario.environment, &scenario.tolerances);
    Ok(Flight {
        trajectory,
        touchdown,
    })
}

fn lander_model<'a, C: CommandSource + ?Sized>(
    scenario: &'a Scenario,
    controller: &'a C,
) -> Result<LanderModel<'a, C, SyntheticEnvironment>, ScenarioError> {
    let model = LanderModel::new(scenario.params, controller, &scenario.environment)?;
    Ok(match scenario.drag {
        Some(drag) => model.with_drag(drag),
        None => model,
    })
}

fn integrate<C: CommandSource + ?Sized>(
    scenario: &Scenario,
    model: &LanderModel<'_, C, SyntheticEnvironment>,
) -> Result<Trajectory, ScenarioError> {
    let environment = &scenario.environment;
    let touched_down =
        |_t: f64, y: &[f64]| environment.altitude(&LanderState::from_slice(y).position()) <= 0.0;
    let y0 = scenario.initial_state.to_array();
    let settings = scenario.integrator;
    let trajectory = match settings.choice {
        IntegratorChoice::Rk4 => Rk4.solve(
            model,
            0.0,
            &y0,
            settings.step,
            settings.max_steps,
            Some(&touched_down),
        )?,
        IntegratorChoice::Rkf45(solver) => solver.solve(
            model,
            0.0,
            &y0,
            settings.step,
            settings.max_steps,
            Some(&touched_down),
        )?,
    };
    Ok(trajectory)
}

/// Classify the last row against the terrain under it.
pub fn classify_touchdown<E: Environment + ?Sized>(
    trajectory: &Trajectory,
    environment: &E,
    tolerances: &LandingTolerances,
) -> TouchdownReport {
    let last = trajectory.last();
    let state = LanderState::from_slice(&last.state);
    let altitude = environment.altitude(&state.position());
    TouchdownReport {
        time: last.t,
        state,
        outcome: classify_with_altitude(&state, altitude, tolerances),
        timed_out: trajectory.timed_out(),
    }
}

/// Sum of squared touchdown errors, each normalised by its tolerance, plus penalties for
/// crashing and for never touching down. A safe touchdown costs at most 5.
pub fn landing_cost(report: &TouchdownReport, tolerances: &LandingTolerances) -> f64 {
    let state = &report.state;
    let terms = [
        state.x / tolerances.position,
        normalize(state.theta) / tolerances.attitude,
        state.vx / tolerances.horizontal_speed,
        state.vy / tolerances.vertical_speed,
        state.omega / tolerances.angular_rate,
    ];
    let mut cost: f64 = terms.iter().map(|term| term * term).sum();
    if report.timed_out {
        cost += TIMEOUT_PENALTY;
    }
    if report.outcome == LandingOutcome::Crash {
        cost += CRASH_PENALTY;
    }
    cost
}

/// Feedback gains in, landing cost out.
///
/// Open-loop scenarios are tuned as pure feedback; combined scenarios keep their feed-forward
/// plan, which is computed once here and shared by every evaluation.
#[derive(Debug, Clone)]
pub struct GainTuningProblem {
    scenario: Scenario,
    feedforward: Option<OpenLoopProfile>,
}

impl GainTuningProblem {
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        let feedforward = match scenario.controller {
            ControllerKind::Combined => Some(scenario.open_loop_profile()?),
            ControllerKind::Feedback | ControllerKind::OpenLoop => None,
        };
        Ok(Self {
            scenario,
            feedforward,
        })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn controller_for(&self, genes: &[f64]) -> Result<Controller, ScenarioError> {
        let feedback = self
            .scenario
            .feedback_with(FeedbackGains::from_slice(genes)?)?;
        Ok(match &self.feedforward {
            Some(profile) => Controller::combined(profile.clone(), feedback),
            None => Controller::Feedback(feedback),
        })
    }

    fn flight(&self, genes: &[f64]) -> Result<Flight, ScenarioError> {
        let controller = self.controller_for(genes)?;
        fly(&self.scenario, &controller)
    }
}

impl FitnessFunction for GainTuningProblem {
    fn evaluate(&self, genes: &[f64]) -> Evaluation {
        match self.flight(genes) {
            Ok(flight) => {
                let touchdown = &flight.touchdown;
                Evaluation::with_summary(
                    landing_cost(touchdown, &self.scenario.tolerances),
                    TrajectorySummary {
                        final_time: touchdown.time,
                        steps: flight.trajectory.steps(),
                        timed_out: touchdown.timed_out,
                        min_distance: None,
                        touchdown_speed: Some(touchdown.state.vy.abs()),
                    },
                )
            }
            Err(_) => Evaluation::new(f64::INFINITY),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningMethod {
    Genetic,
    Gradient,
}

impl TuningMethod {
    pub fn label(self) -> &'static str {
        match self {
            TuningMethod::Genetic => "genetic",
            TuningMethod::Gradient => "gradient",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuningOutcome {
    pub method: TuningMethod,
    pub gains: FeedbackGains,
    pub fitness: f64,
    pub summary: Option<TrajectorySummary>,
    pub evaluations: usize,
    /// Best fitness per generation or iteration.
    pub history: Vec<f64>,
}

/// Tune the scenario's feedback gains inside its configured bounds, starting from the
/// configured gains projected onto those bounds.
pub fn tune_gains(
    scenario: &Scenario,
    method: TuningMethod,
    seed: Option<u64>,
) -> Result<TuningOutcome, ScenarioError> {
    let problem = GainTuningProblem::new(scenario.clone())?;
    let bounds = scenario.tuning.gain_bounds.clone();
    let start = scenario.gains.to_array().to_vec();

    let (parameters, fitness, summary, evaluations, history) = match method {
        TuningMethod::Genetic => {
            let config = GeneticConfig {
                seed: seed.unwrap_or(scenario.tuning.genetic.seed),
                ..scenario.tuning.genetic
            };
            let result = GeneticAlgorithm::new(bounds, config)?.run_from(&problem, vec![start])?;
            let history = result.history.iter().map(|stats| stats.best).collect();
            let fitness = result.best.score();
            let summary = result.best.summary().copied();
            (
                result.best.into_genes(),
                fitness,
                summary,
                result.evaluations,
                history,
            )
        }
        TuningMethod::Gradient => {
            let result = GradientDescent::new(bounds, scenario.tuning.gradient)?.run(&problem, &start)?;
            let history = result.history.iter().map(|stats| stats.fitness).collect();
            (
                result.parameters,
                result.fitness,
                result.summary,
                result.evaluations,
                history,
            )
        }
    };

    Ok(TuningOutcome {
        method,
        gains: FeedbackGains::from_slice(&parameters)?,
        fitness,
        summary,
        evaluations,
        history,
    })
}
