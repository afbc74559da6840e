//! Export helpers for CSV and JSON artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub mod trajectory {
    use std::io::{self, Write};

    use serde::Serialize;

    /// One lander trajectory row with the command issued at that time.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    pub struct LanderRow {
        pub t: f64,
        pub x: f64,
        pub y: f64,
        pub theta: f64,
        pub vx: f64,
        pub vy: f64,
        pub omega: f64,
        pub thrust: f64,
        pub torque: f64,
        pub altitude: f64,
        pub ground_contact: bool,
    }

    /// One body sample of an N-body propagation.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct BodyRow<'a> {
        pub t: f64,
        pub body: &'a str,
        pub x: f64,
        pub y: f64,
        pub z: f64,
        pub vx: f64,
        pub vy: f64,
        pub vz: f64,
    }

    /// Write rows as CSV with a header derived from the row's field names.
    pub fn write_csv<W, R>(writer: W, rows: &[R]) -> io::Result<()>
    where
        W: Write,
        R: Serialize,
    {
        let mut csv = csv::Writer::from_writer(writer);
        for row in rows {
            csv.serialize(row)?;
        }
        csv.flush()
    }
}

pub mod summary {
    use std::io::{self, Write};
    use std::path::Path;

    use serde::Serialize;
    use serde_json::to_writer_pretty;

    /// Outcome of one descent run.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct DescentSummary {
        pub scenario: String,
        pub controller: String,
        pub outcome: String,
        pub steps: usize,
        pub touchdown_time_s: f64,
        /// `[x, y, θ, ẋ, ẏ, θ̇]` at the last row.
        pub final_state: [f64; 6],
        pub timed_out: bool,
        pub generated_utc: String,
    }

    /// Best parameters found by a tuning run.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct TuningSummary {
        pub scenario: String,
        pub method: String,
        pub parameters: Vec<f64>,
        pub fitness: f64,
        pub evaluations: usize,
        pub generated_utc: String,
    }

    /// Pretty-print `value` as JSON to `path`, creating parent directories.
    pub fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
        let mut writer = crate::writer_for_path(path)?;
        to_writer_pretty(&mut writer, value)?;
        writeln!(writer)?;
        writer.flush()
    }
}
