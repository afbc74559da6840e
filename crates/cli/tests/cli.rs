use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const SCENARIO: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../configs/titan_descent.yaml"
);
const BODIES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../configs/bodies");

fn bin(name: &str) -> Command {
    let mut cmd = Command::cargo_bin(name).expect("binary");
    cmd.env("DESCENT_LOG_QUIET", "1");
    cmd
}

#[test]
fn descent_reports_a_safe_landing_and_writes_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("runs/titan.csv");
    let json_path = dir.path().join("titan.json");

    bin("descent")
        .args([
            "--config",
            SCENARIO,
            "--output",
            csv_path.to_str().unwrap(),
            "--summary",
            json_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Descent Report ==="))
        .stdout(predicate::str::contains("Outcome        : safe landing"));

    let mut reader = csv::Reader::from_path(&csv_path).expect("csv");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(&headers[0], "t");
    assert_eq!(&headers[7], "thrust");
    assert_eq!(&headers[10], "ground_contact");
    let records: Vec<_> = reader.records().collect::<Result<_, _>>().expect("records");
    assert!(records.len() > 700);
    assert_eq!(&records[0][2], "1500.0");

    let summary = fs::read_to_string(&json_path).expect("summary");
    assert!(summary.contains("\"outcome\": \"safe landing\""));
    assert!(summary.contains("\"controller\": \"feedback\""));
    assert!(summary.contains("\"generated_utc\""));
}

#[test]
fn descent_streams_csv_to_stdout() {
    bin("descent")
        .args(["--config", SCENARIO, "--output", "-"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("t,x,y,theta,vx,vy,omega"))
        .stdout(predicate::str::contains("===").not());
}

#[test]
fn descent_controller_override() {
    bin("descent")
        .args(["--config", SCENARIO, "--controller", "open-loop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Controller     : open-loop"));
}

#[test]
fn descent_missing_scenario_fails() {
    bin("descent")
        .args(["--config", "no/such/scenario.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading scenario"));
}

#[test]
fn tune_prints_the_best_gains() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scenario = dir.path().join("small.yaml");
    fs::write(
        &scenario,
        "name: small\noptimizer:\n  genetic:\n    population_size: 4\n    generations: 1\n    elite_count: 1\n    tournament_size: 2\n",
    )
    .expect("write scenario");
    let json_path = dir.path().join("tuned.json");

    bin("tune")
        .args([
            "--config",
            scenario.to_str().unwrap(),
            "--seed",
            "3",
            "--summary",
            json_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Tuned Gains ==="))
        .stdout(predicate::str::contains("Method      : genetic"))
        .stdout(predicate::str::contains("Best cost"));

    let summary = fs::read_to_string(&json_path).expect("summary");
    assert!(summary.contains("\"scenario\": \"small\""));
    assert!(summary.contains("\"method\": \"genetic\""));
}

#[test]
fn tune_runs_gradient_descent() {
    bin("tune")
        .args(["--config", SCENARIO, "--method", "gradient", "--iterations", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Method      : gradient"));
}

#[test]
fn propagate_reports_closest_approach() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("bodies.csv");

    bin("propagate")
        .args([
            "--bodies",
            BODIES,
            "--days",
            "30",
            "--from",
            "earth",
            "--to",
            "mars",
            "--output",
            csv_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Propagation ==="))
        .stdout(predicate::str::contains("Closest     : Earth - Mars"));

    let mut reader = csv::Reader::from_path(&csv_path).expect("csv");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        ["t", "body", "x", "y", "z", "vx", "vy", "vz"]
    );
    let records: Vec<_> = reader.records().collect::<Result<_, _>>().expect("records");
    assert_eq!(records.len() % 5, 0);
    assert_eq!(&records[0][0], "0.0");
}

#[test]
fn propagate_requires_both_query_bodies() {
    bin("propagate")
        .args(["--bodies", BODIES, "--from", "earth"])
        .assert()
        .failure();
}

#[test]
fn propagate_rejects_unknown_bodies() {
    bin("propagate")
        .args(["--bodies", BODIES, "--days", "1", "--from", "earth", "--to", "vulcan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("vulcan"));
}
