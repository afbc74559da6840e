use std::fs;

use descent_export::summary::{DescentSummary, write_json};
use descent_export::trajectory::{BodyRow, LanderRow, write_csv};
use descent_export::writer_for_path;
use tempfile::tempdir;

fn row(t: f64, y: f64) -> LanderRow {
    LanderRow {
        t,
        x: 0.5,
        y,
        theta: 0.0,
        vx: 0.0,
        vy: -1.0,
        omega: 0.0,
        thrust: 1.2,
        torque: 0.0,
        altitude: y,
        ground_contact: y <= 0.0,
    }
}

#[test]
fn lander_csv_has_header_and_rows() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("nested/run.csv");
    let writer = writer_for_path(&path).expect("writer");
    write_csv(writer, &[row(0.0, 10.0), row(1.0, 0.0)]).expect("write");

    let contents = fs::read_to_string(&path).expect("read back");
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some("t,x,y,theta,vx,vy,omega,thrust,torque,altitude,ground_contact")
    );
    assert_eq!(lines.next(), Some("0.0,0.5,10.0,0.0,0.0,-1.0,0.0,1.2,0.0,10.0,false"));
    assert!(lines.next().is_some_and(|line| line.ends_with("true")));
    assert!(lines.next().is_none());
}

#[test]
fn body_csv_names_each_sample() {
    let mut buffer = Vec::new();
    let rows = [BodyRow {
        t: 86400.0,
        body: "Earth",
        x: 1.0,
        y: 2.0,
        z: 3.0,
        vx: 4.0,
        vy: 5.0,
        vz: 6.0,
    }];
    write_csv(&mut buffer, &rows).expect("write");
    let text = String::from_utf8(buffer).expect("utf8");
    assert!(text.starts_with("t,body,x,y,z,vx,vy,vz\n"));
    assert!(text.contains("86400.0,Earth,1.0,2.0,3.0,4.0,5.0,6.0"));
}

#[test]
fn summary_json_is_pretty_printed() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("summary.json");
    let summary = DescentSummary {
        scenario: "titan".to_string(),
        controller: "feedback".to_string(),
        outcome: "safe-landing".to_string(),
        steps: 722,
        touchdown_time_s: 722.0,
        final_state: [0.6, 0.0, -0.1, 0.0, -0.8, 0.0],
        timed_out: false,
        generated_utc: "2026-01-01T00:00:00Z".to_string(),
    };
    write_json(&path, &summary).expect("write");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(value["steps"], 722);
    assert_eq!(value["outcome"], "safe-landing");
    assert_eq!(value["final_state"].as_array().map(Vec::len), Some(6));
}
