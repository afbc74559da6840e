use descent_sim::config::BodyConfig;
use descent_sim::constants::{AU_M, G};
use descent_sim::dynamics::nbody::{body_position, separation};
use descent_sim::dynamics::{Body, PhysicsEngine};
use descent_sim::mission::{
    MissionError, PropagationSettings, TransferProblem, body_index, closest_approach,
    propagate_probe, propagate_system,
};
use descent_sim::optimize::FitnessFunction;
use descent_sim::scenario::{Catalog, load_catalog};
use descent_sim::vector;

const SUN_MASS_KG: f64 = 1.988_47e30;

fn body(name: &str, mass_kg: f64, position_m: [f64; 3], velocity_m_s: [f64; 3]) -> BodyConfig {
    BodyConfig {
        name: name.to_string(),
        mass_kg,
        position_m,
        velocity_m_s,
        fixed: false,
    }
}

fn sun_and_earth() -> Catalog {
    let speed = (G * SUN_MASS_KG / AU_M).sqrt();
    let mut sun = body("Sun", SUN_MASS_KG, [0.0; 3], [0.0; 3]);
    sun.fixed = true;
    Catalog::try_from(vec![
        sun,
        body("Earth", 5.9722e24, [AU_M, 0.0, 0.0], [0.0, speed, 0.0]),
    ])
    .expect("catalog")
}

#[test]
fn circular_orbit_keeps_its_radius_around_a_pinned_sun() {
    let catalog = sun_and_earth();
    let settings = PropagationSettings::days(365.0);
    let trajectory = propagate_system(&catalog, &settings).expect("propagation");

    assert!(!trajectory.timed_out());
    assert!(trajectory.last().t >= settings.duration);
    for row in trajectory.rows() {
        assert_eq!(body_position(&row.state, 0), [0.0; 3]);
        let radius = separation(&row.state, 0, 1);
        assert!(
            ((radius - AU_M) / AU_M).abs() < 1e-6,
            "radius drifted to {radius} at t = {}",
            row.t
        );
    }
}

#[test]
fn straight_line_flyby_finds_the_closest_approach() {
    let catalog = Catalog::try_from(vec![
        body("a", 1.0, [0.0; 3], [0.0; 3]),
        body("b", 1.0, [-1.0e6, 1.0e3, 0.0], [1_000.0, 0.0, 0.0]),
    ])
    .expect("catalog");
    let settings = PropagationSettings {
        duration: 2_000.0,
        initial_step: 0.1,
        max_step: Some(0.1),
        ..PropagationSettings::default()
    };
    let trajectory = propagate_system(&catalog, &settings).expect("propagation");
    let approach = closest_approach(&trajectory, 0, 1).expect("approach");

    assert!((approach.distance - 1_000.0).abs() < 1.0, "{approach:?}");
    assert!((approach.t - 1_000.0).abs() < 0.5, "{approach:?}");
}

#[test]
fn closest_approach_rejects_unknown_indices() {
    let catalog = sun_and_earth();
    let trajectory =
        propagate_system(&catalog, &PropagationSettings::days(1.0)).expect("propagation");
    assert!(matches!(
        closest_approach(&trajectory, 0, 2),
        Err(MissionError::BodyIndex { index: 2, count: 2 })
    ));
}

#[test]
fn propagation_rejects_a_non_positive_duration() {
    let settings = PropagationSettings {
        duration: 0.0,
        ..PropagationSettings::default()
    };
    assert!(matches!(
        propagate_system(&sun_and_earth(), &settings),
        Err(MissionError::InvalidSettings(_))
    ));
}

#[test]
fn probe_follows_a_circular_orbit_through_the_engine_field() {
    let mut engine = PhysicsEngine::newtonian(0.0).expect("engine");
    engine
        .add_body(Body::new("Sun", SUN_MASS_KG, [0.0; 3], [0.0; 3]))
        .expect("sun");

    let speed = (G * SUN_MASS_KG / AU_M).sqrt();
    let probe = [AU_M, 0.0, 0.0, 0.0, speed, 0.0];
    let steps = 24 * 30;
    let samples = propagate_probe(&mut engine, probe, 3_600.0, steps).expect("probe");

    assert_eq!(samples.len(), steps + 1);
    assert_eq!(samples[0], (0.0, probe));
    let (t_end, last) = samples[steps];
    assert!((t_end - 3_600.0 * steps as f64).abs() < 1e-6);
    assert!((engine.time() - t_end).abs() < 1e-6);

    for (_, state) in &samples {
        let radius = vector::norm(&[state[0], state[1], state[2]]);
        assert!(((radius - AU_M) / AU_M).abs() < 1e-6);
    }
    // A month is about a twelfth of the orbit.
    let angle = last[1].atan2(last[0]);
    let expected = speed * t_end / AU_M;
    assert!((angle - expected).abs() < 1e-4);
}

#[test]
fn shipped_catalog_keeps_the_sun_in_place() {
    let catalog = load_catalog("configs/bodies").expect("catalog");
    let sun = body_index(&catalog, "Sun").expect("sun");
    let trajectory =
        propagate_system(&catalog, &PropagationSettings::days(30.0)).expect("propagation");
    let start = body_position(&trajectory.initial().state, sun);
    for row in trajectory.rows() {
        assert_eq!(body_position(&row.state, sun), start);
    }
    assert!(matches!(
        body_index(&catalog, "Vulcan"),
        Err(MissionError::UnknownBody(name)) if name == "Vulcan"
    ));
}

#[test]
fn transfer_problem_reports_distance_as_fitness() {
    let catalog = load_catalog("configs/bodies").expect("catalog");
    let problem = TransferProblem::new(catalog, "earth", "mars", PropagationSettings::days(20.0))
        .expect("problem");

    let probe_catalog = problem.probe_catalog(&[0.0, 1_000.0, 0.0]).expect("probe");
    let probe = probe_catalog.bodies.last().expect("probe body");
    assert_eq!(probe.name, "probe");
    assert_eq!(probe_catalog.len(), 6);

    let evaluation = problem.evaluate(&[0.0, 1_000.0, 0.0]);
    assert!(evaluation.fitness.is_finite());
    let summary = evaluation.summary.expect("summary");
    assert_eq!(summary.min_distance, Some(evaluation.fitness));
    assert!(summary.final_time >= problem.settings().duration);
    assert!(summary.touchdown_speed.is_none());

    let (_, approach) = problem.fly(&[0.0, 1_000.0, 0.0]).expect("flight");
    assert_eq!(approach.distance, evaluation.fitness);

    assert!(problem.evaluate(&[1.0, 2.0]).fitness.is_infinite());
    assert!(matches!(
        problem.probe_catalog(&[1.0, 2.0]),
        Err(MissionError::DeltaVDimension(2))
    ));
}

#[test]
fn transfer_problem_needs_known_bodies() {
    let result = TransferProblem::new(
        sun_and_earth(),
        "Earth",
        "Mars",
        PropagationSettings::days(10.0),
    );
    assert!(matches!(result, Err(MissionError::UnknownBody(_))));
}
