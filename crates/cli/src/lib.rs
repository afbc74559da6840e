//! Plumbing shared by the `descent`, `tune` and `propagate` binaries: timestamped logging and
//! conversion of run results into export records.

use chrono::Utc;
use descent_sim::descent::{DescentReport, TuningOutcome};
use descent_sim::dynamics::nbody::{body_position, body_velocity};
use descent_sim::export::summary::{DescentSummary, TuningSummary};
use descent_sim::export::trajectory::{BodyRow, LanderRow};
use descent_sim::ode::Trajectory;

/// Set to any value to silence `info!` output.
pub const QUIET_ENV: &str = "DESCENT_LOG_QUIET";

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        if !$crate::quiet() {
            eprintln!("\x1b[32m[INFO] [{}]\x1b[0m {}", $crate::timestamp(), format!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        eprintln!("\x1b[35m[WARN] [{}]\x1b[0m {}", $crate::timestamp(), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        eprintln!("\x1b[31m[ERROR][{}]\x1b[0m {}", $crate::timestamp(), format!($($arg)*))
    };
}

pub fn quiet() -> bool {
    std::env::var_os(QUIET_ENV).is_some()
}

/// Wall-clock time of day for log lines.
pub fn timestamp() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

/// Full UTC stamp recorded in JSON summaries.
pub fn generated_utc() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// One CSV row per trajectory row, paired with the diagnostics recorded there.
pub fn lander_rows(report: &DescentReport) -> Vec<LanderRow> {
    report
        .trajectory
        .rows()
        .iter()
        .zip(&report.diagnostics)
        .map(|(row, diag)| {
            let s = &row.state;
            LanderRow {
                t: row.t,
                x: s[0],
                y: s[1],
                theta: s[2],
                vx: s[3],
                vy: s[4],
                omega: s[5],
                thrust: diag.thrust,
                torque: diag.torque,
                altitude: diag.altitude,
                ground_contact: diag.ground_contact,
            }
        })
        .collect()
}

/// Flatten a packed N-body trajectory into one row per body per sample.
pub fn body_rows<'a>(trajectory: &Trajectory, names: &[&'a str]) -> Vec<BodyRow<'a>> {
    let mut rows = Vec::with_capacity(trajectory.len() * names.len());
    for row in trajectory.rows() {
        for (index, name) in names.iter().enumerate() {
            let [x, y, z] = body_position(&row.state, index);
            let [vx, vy, vz] = body_velocity(&row.state, index);
            rows.push(BodyRow {
                t: row.t,
                body: name,
                x,
                y,
                z,
                vx,
                vy,
                vz,
            });
        }
    }
    rows
}

pub fn descent_summary(scenario: &str, report: &DescentReport) -> DescentSummary {
    let touchdown = &report.touchdown;
    DescentSummary {
        scenario: scenario.to_string(),
        controller: report.controller.to_string(),
        outcome: touchdown.outcome.label().to_string(),
        steps: report.steps(),
        touchdown_time_s: touchdown.time,
        final_state: touchdown.state.to_array(),
        timed_out: touchdown.timed_out,
        generated_utc: generated_utc(),
    }
}

pub fn tuning_summary(scenario: &str, outcome: &TuningOutcome) -> TuningSummary {
    TuningSummary {
        scenario: scenario.to_string(),
        method: outcome.method.label().to_string(),
        parameters: outcome.gains.to_array().to_vec(),
        fitness: outcome.fitness,
        evaluations: outcome.evaluations,
        generated_utc: generated_utc(),
    }
}
