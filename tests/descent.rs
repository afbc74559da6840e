use descent_sim::descent::{
    CRASH_PENALTY, GainTuningProblem, TIMEOUT_PENALTY, TuningMethod, fly, landing_cost,
    simulate_descent, tune_gains,
};
use descent_sim::dynamics::{LanderState, SyntheticEnvironment, TerrainModel, WindModel};
use descent_sim::guidance::{
    Controller, FeedbackGains, LandingOutcome, LandingTolerances, TouchdownReport,
};
use descent_sim::ode::Rkf45;
use descent_sim::optimize::FitnessFunction;
use descent_sim::scenario::{
    ControllerKind, IntegratorChoice, IntegratorSettings, Scenario, load_scenario,
};

fn titan() -> Scenario {
    Scenario::titan().expect("titan scenario")
}

fn touchdown(state: LanderState, outcome: LandingOutcome, timed_out: bool) -> TouchdownReport {
    TouchdownReport {
        time: 700.0,
        state,
        outcome,
        timed_out,
    }
}

#[test]
fn configured_titan_descent_lands_softly() {
    let scenario = load_scenario("configs/titan_descent.yaml").expect("shipped scenario");
    let report = simulate_descent(&scenario).expect("descent");

    assert_eq!(report.controller, "feedback");
    assert_eq!(report.outcome(), LandingOutcome::SafeLanding);
    assert!(!report.touchdown.timed_out);
    assert!(
        (700..=740).contains(&report.steps()),
        "unexpected step count {}",
        report.steps()
    );
    assert_eq!(report.diagnostics.len(), report.trajectory.len());

    let last = report.touchdown.state;
    assert!(last.y <= 0.0);
    assert!(last.vy.abs() < 2.0, "touchdown speed {}", last.vy);
    assert!(last.x.abs() < 20.0);

    let contact = report.diagnostics.last().expect("diagnostics");
    assert!(contact.altitude <= 0.0);
    assert!(report.diagnostics[0].altitude > 1_000.0);
}

#[test]
fn descent_is_reproducible() {
    let scenario = titan();
    let first = simulate_descent(&scenario).expect("first run");
    let second = simulate_descent(&scenario).expect("second run");
    assert_eq!(first, second);
}

#[test]
fn titan_descent_without_drag_crashes() {
    let mut scenario = titan();
    scenario.drag = None;
    let report = simulate_descent(&scenario).expect("descent");
    assert_eq!(report.outcome(), LandingOutcome::Crash);
    assert!(report.touchdown.state.vy < -2.0);
}

#[test]
fn adaptive_integrator_reaches_the_same_verdict() {
    let mut scenario = titan();
    scenario.integrator = IntegratorSettings {
        choice: IntegratorChoice::Rkf45(Rkf45::new(1e-6).with_max_step(5.0)),
        step: 1.0,
        max_steps: 5_000,
    };
    let report = simulate_descent(&scenario).expect("descent");
    assert_eq!(report.outcome(), LandingOutcome::SafeLanding);
    assert!(report.touchdown.state.vy.abs() < 2.0);
}

#[test]
fn raised_terrain_stops_the_run_at_its_surface() {
    let mut scenario = titan();
    scenario.environment = SyntheticEnvironment::new(TerrainModel::flat(100.0), WindModel::Calm);
    let report = simulate_descent(&scenario).expect("descent");

    let last = report.touchdown.state;
    assert!(last.y <= 100.0);
    assert!(last.y > 90.0, "stopped at y = {}", last.y);
    assert_ne!(report.outcome(), LandingOutcome::Airborne);
}

#[test]
fn open_loop_and_combined_runs_stay_within_actuator_limits() {
    for kind in [ControllerKind::OpenLoop, ControllerKind::Combined] {
        let mut scenario = titan();
        scenario.controller = kind;
        let report = simulate_descent(&scenario).expect("descent");

        assert_eq!(report.controller, kind.label());
        assert!(!report.touchdown.timed_out);
        assert_ne!(report.outcome(), LandingOutcome::Airborne);

        let limits = scenario.params.limits;
        for diag in &report.diagnostics {
            assert!((0.0..=limits.max_thrust).contains(&diag.thrust));
            assert!(diag.torque.abs() <= limits.max_torque);
        }
    }
}

#[test]
fn step_limit_marks_the_run_timed_out() {
    let mut scenario = titan();
    scenario.integrator.max_steps = 10;
    let report = simulate_descent(&scenario).expect("descent");
    assert!(report.touchdown.timed_out);
    assert_eq!(report.outcome(), LandingOutcome::Airborne);
    assert_eq!(report.steps(), 10);
}

#[test]
fn fly_accepts_any_command_source() {
    let scenario = titan();
    let controller = Controller::Feedback(scenario.feedback().expect("feedback"));
    let flight = fly(&scenario, &controller).expect("flight");
    let report = simulate_descent(&scenario).expect("descent");
    assert_eq!(flight.trajectory, report.trajectory);
    assert_eq!(flight.touchdown, report.touchdown);
}

#[test]
fn landing_cost_orders_outcomes() {
    let tolerances = LandingTolerances::default();
    let gentle = LanderState::new(1.0, 0.0, 0.01, 0.1, -0.5, 0.0);
    let hard = LanderState::new(1.0, 0.0, 0.01, 0.1, -6.0, 0.0);

    let safe = landing_cost(
        &touchdown(gentle, LandingOutcome::SafeLanding, false),
        &tolerances,
    );
    let crash = landing_cost(&touchdown(hard, LandingOutcome::Crash, false), &tolerances);
    let stalled = landing_cost(
        &touchdown(gentle, LandingOutcome::Airborne, true),
        &tolerances,
    );

    assert!(safe <= 5.0);
    assert!(crash > CRASH_PENALTY);
    assert!(stalled >= TIMEOUT_PENALTY);
    assert!(safe < crash && crash < stalled);
}

#[test]
fn perfect_touchdown_costs_nothing() {
    let state = LanderState::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    let cost = landing_cost(
        &touchdown(state, LandingOutcome::SafeLanding, false),
        &LandingTolerances::default(),
    );
    assert_eq!(cost, 0.0);
}

#[test]
fn tuning_problem_scores_the_configured_gains() {
    let scenario = titan();
    let problem = GainTuningProblem::new(scenario.clone()).expect("problem");

    let evaluation = problem.evaluate(&FeedbackGains::default().to_array());
    assert!(evaluation.fitness.is_finite());
    assert!(evaluation.fitness <= 5.0, "cost {}", evaluation.fitness);

    let summary = evaluation.summary.expect("summary");
    let report = simulate_descent(&scenario).expect("descent");
    assert_eq!(summary.steps, report.steps());
    assert!(!summary.timed_out);
    assert_eq!(
        summary.touchdown_speed,
        Some(report.touchdown.state.vy.abs())
    );
    assert!(summary.min_distance.is_none());

    let invalid = problem.evaluate(&[0.1, 0.2]);
    assert!(invalid.fitness.is_infinite());
    assert!(invalid.summary.is_none());
}

#[test]
fn combined_tuning_keeps_the_feedforward_plan() {
    let mut scenario = titan();
    scenario.controller = ControllerKind::Combined;
    let problem = GainTuningProblem::new(scenario).expect("problem");
    let controller = problem
        .controller_for(&FeedbackGains::default().to_array())
        .expect("controller");
    assert_eq!(controller.name(), "combined");
}

#[test]
fn genetic_tuning_never_loses_to_the_starting_gains() {
    let mut scenario = titan();
    scenario.tuning.genetic.population_size = 6;
    scenario.tuning.genetic.generations = 2;
    scenario.tuning.genetic.elite_count = 1;
    scenario.tuning.genetic.tournament_size = 2;

    let baseline = GainTuningProblem::new(scenario.clone())
        .expect("problem")
        .evaluate(&scenario.gains.to_array())
        .fitness;
    let outcome = tune_gains(&scenario, TuningMethod::Genetic, Some(7)).expect("tuning");

    assert_eq!(outcome.method, TuningMethod::Genetic);
    assert!(outcome.fitness <= baseline);
    assert_eq!(outcome.history.len(), 3);
    assert!(outcome.history.windows(2).all(|w| w[1] <= w[0]));
    assert!(outcome.summary.is_some());

    let genes = outcome.gains.to_array();
    assert!(scenario.tuning.gain_bounds.contains(&genes));

    let again = tune_gains(&scenario, TuningMethod::Genetic, Some(7)).expect("tuning");
    assert_eq!(again, outcome);
}

#[test]
fn gradient_tuning_never_loses_to_the_starting_gains() {
    let mut scenario = titan();
    scenario.tuning.gradient.max_iterations = 2;

    let baseline = GainTuningProblem::new(scenario.clone())
        .expect("problem")
        .evaluate(&scenario.gains.to_array())
        .fitness;
    let outcome = tune_gains(&scenario, TuningMethod::Gradient, None).expect("tuning");

    assert_eq!(outcome.method, TuningMethod::Gradient);
    assert!(outcome.fitness <= baseline);
    assert!(outcome.evaluations > 1);
}
