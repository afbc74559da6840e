use std::fs;

use descent_config::{
    ConfigError, ControllerConfig, IntegratorMethod, ScenarioConfig, TerrainConfig, WindConfig,
    load_bodies, load_scenario,
};
use tempfile::tempdir;

#[test]
fn empty_scenario_is_the_titan_reference() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("empty.yaml");
    fs::write(&path, "{}\n").expect("write");

    let scenario = load_scenario(&path).expect("scenario");
    assert_eq!(scenario, ScenarioConfig::default());
    assert_eq!(scenario.lander.gravity_m_s2, 1.352);
    assert_eq!(scenario.initial_state.to_array(), [0.0, 1500.0, 0.0, 1.487, 0.0, 0.0]);
    let drag = scenario.drag.expect("drag enabled by default");
    assert_eq!(drag.coefficient_kg_m, 13.5);
    assert_eq!(scenario.controller.kind(), "feedback");
    assert_eq!(
        scenario.controller.gains().map(|g| g.to_array()),
        Some([0.0001, 0.00005, 0.0005, 0.0002, 10.0, 5.0])
    );
}

#[test]
fn yaml_scenario_overrides_nested_fields() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("custom.yaml");
    fs::write(
        &path,
        r#"
name: windy
lander:
  mass_kg: 800
drag: null
environment:
  terrain:
    type: noise
    amplitude_m: 15
    wavelength_m: 400
    seed: 9
  wind:
    type: constant
    velocity_m_s: [2.0, 0.0, 0.5]
controller:
  type: combined
  plan:
    target_time_s: 90
integrator:
  method: rkf45
  tolerance: 1.0e-8
"#,
    )
    .expect("write");

    let scenario = load_scenario(&path).expect("scenario");
    assert_eq!(scenario.name, "windy");
    assert_eq!(scenario.lander.mass_kg, 800.0);
    assert_eq!(scenario.lander.max_thrust_m_s2, 4.0);
    assert!(scenario.drag.is_none());
    assert_eq!(
        scenario.environment.terrain,
        TerrainConfig::Noise {
            base_height_m: 0.0,
            amplitude_m: 15.0,
            wavelength_m: 400.0,
            seed: 9
        }
    );
    assert_eq!(
        scenario.environment.wind,
        WindConfig::Constant {
            velocity_m_s: [2.0, 0.0, 0.5]
        }
    );
    match &scenario.controller {
        ControllerConfig::Combined { gains, plan } => {
            assert_eq!(gains.kp_theta, 10.0);
            assert_eq!(plan.target_time_s, 90.0);
            assert_eq!(plan.resolution_s, 0.1);
        }
        other => panic!("expected combined controller, got {other:?}"),
    }
    assert_eq!(scenario.integrator.method, IntegratorMethod::Rkf45);
    assert_eq!(scenario.integrator.tolerance, 1e-8);
}

#[test]
fn toml_scenario_is_accepted() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("scenario.toml");
    fs::write(
        &path,
        r#"
name = "open-loop"

[controller]
type = "open-loop"

[initial_state]
vx_m_s = 0.0
"#,
    )
    .expect("write");

    let scenario = load_scenario(&path).expect("scenario");
    assert_eq!(scenario.controller.kind(), "open-loop");
    assert!(scenario.controller.gains().is_none());
    assert_eq!(scenario.initial_state.vx_m_s, 0.0);
    assert_eq!(scenario.initial_state.y_m, 1500.0);
}

#[test]
fn unknown_controller_type_is_a_parse_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "controller:\n  type: autopilot\n").expect("write");
    assert!(matches!(load_scenario(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn missing_scenario_is_an_io_error() {
    let dir = tempdir().expect("tempdir");
    assert!(matches!(
        load_scenario(dir.path().join("missing.yaml")),
        Err(ConfigError::Io(_))
    ));
    assert!(matches!(
        load_scenario(dir.path()),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn body_directory_loads_in_name_order() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("b_planet.toml"),
        "name = \"Planet\"\nmass_kg = 6.0e24\nposition_m = [1.5e11, 0.0, 0.0]\nvelocity_m_s = [0.0, 29780.0, 0.0]\n",
    )
    .expect("write");
    fs::write(
        dir.path().join("a_star.toml"),
        "name = \"Star\"\nmass_kg = 2.0e30\nposition_m = [0.0, 0.0, 0.0]\nvelocity_m_s = [0.0, 0.0, 0.0]\nfixed = true\n",
    )
    .expect("write");
    fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

    let bodies = load_bodies(dir.path()).expect("bodies");
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0].name, "Star");
    assert!(bodies[0].fixed);
    assert_eq!(bodies[1].name, "Planet");
    assert!(!bodies[1].fixed);
}

#[test]
fn body_yaml_list_is_accepted_and_validated() {
    let dir = tempdir().expect("tempdir");
    let good = dir.path().join("bodies.yaml");
    fs::write(
        &good,
        r#"
- name: A
  mass_kg: 1.0e20
  position_m: [0, 0, 0]
  velocity_m_s: [0, 0, 0]
- name: B
  mass_kg: 2.0e20
  position_m: [1.0e9, 0, 0]
  velocity_m_s: [0, 100, 0]
"#,
    )
    .expect("write");
    assert_eq!(load_bodies(&good).expect("bodies").len(), 2);

    let duplicate = dir.path().join("dup.yaml");
    fs::write(
        &duplicate,
        r#"
- name: A
  mass_kg: 1.0
  position_m: [0, 0, 0]
  velocity_m_s: [0, 0, 0]
- name: A
  mass_kg: 1.0
  position_m: [1, 0, 0]
  velocity_m_s: [0, 0, 0]
"#,
    )
    .expect("write");
    assert!(matches!(
        load_bodies(&duplicate),
        Err(ConfigError::Invalid(_))
    ));

    let massless = dir.path().join("massless.yaml");
    fs::write(
        &massless,
        "- name: Dust\n  mass_kg: 0.0\n  position_m: [0, 0, 0]\n  velocity_m_s: [0, 0, 0]\n",
    )
    .expect("write");
    assert!(matches!(
        load_bodies(&massless),
        Err(ConfigError::Invalid(_))
    ));

    let empty = tempdir().expect("tempdir");
    assert!(matches!(
        load_bodies(empty.path()),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn shipped_configs_parse() {
    let root = concat!(env!("CARGO_MANIFEST_DIR"), "/../../configs");
    let scenario = load_scenario(format!("{root}/titan_descent.yaml")).expect("titan scenario");
    assert_eq!(scenario.lander.gravity_m_s2, 1.352);

    let bodies = load_bodies(format!("{root}/bodies")).expect("body catalog");
    let names: Vec<&str> = bodies.iter().map(|b| b.name.as_str()).collect();
    for expected in ["Sun", "Earth", "Mars", "Jupiter", "Saturn"] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }
}
