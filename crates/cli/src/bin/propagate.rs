use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use descent_cli::{body_rows, info, warn};
use descent_sim::constants::{AU_M, SECONDS_PER_DAY};
use descent_sim::dynamics::nbody::body_position;
use descent_sim::export::trajectory::write_csv;
use descent_sim::export::writer_for_path;
use descent_sim::mission::{PropagationSettings, body_index, closest_approach, propagate_system};
use descent_sim::scenario::load_catalog;
use descent_sim::time::days_to_seconds;
use descent_sim::vector;

/// Propagate a body catalog with the adaptive N-body integrator.
#[derive(Parser, Debug)]
#[command(author, version, about = "N-body catalog propagator")]
struct Cli {
    /// Body catalog: a directory of TOML files, a TOML file or a YAML list
    #[arg(long, default_value = "configs/bodies")]
    bodies: PathBuf,

    /// Propagation span in days
    #[arg(long, default_value_t = 365.0)]
    days: f64,

    /// Absolute RKF45 tolerance (m, m/s)
    #[arg(long, default_value_t = 10.0)]
    tolerance: f64,

    /// Largest step in days
    #[arg(long, default_value_t = 2.0)]
    max_step_days: f64,

    /// Gravitational softening length in metres
    #[arg(long, default_value_t = 0.0)]
    softening: f64,

    /// First body of a closest-approach query
    #[arg(long, requires = "to")]
    from: Option<String>,

    /// Second body of a closest-approach query
    #[arg(long, requires = "from")]
    to: Option<String>,

    /// Body-state CSV output (use '-' for stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let catalog = load_catalog(&cli.bodies)
        .with_context(|| format!("loading bodies from {}", cli.bodies.display()))?;
    let settings = PropagationSettings {
        tolerance: cli.tolerance,
        max_step: Some(days_to_seconds(cli.max_step_days)),
        softening: cli.softening,
        ..PropagationSettings::days(cli.days)
    };

    let names = catalog.names();
    info!(
        "propagating {} bodies ({}) for {} days",
        catalog.len(),
        names.join(", "),
        cli.days
    );
    let trajectory = propagate_system(&catalog, &settings)?;
    if trajectory.timed_out() {
        warn!(
            "step limit of {} reached at day {:.2}",
            settings.max_steps,
            trajectory.last().t / SECONDS_PER_DAY
        );
    }

    let approach = match (&cli.from, &cli.to) {
        (Some(from), Some(to)) => {
            let a = body_index(&catalog, from)?;
            let b = body_index(&catalog, to)?;
            Some((a, b, closest_approach(&trajectory, a, b)?))
        }
        _ => None,
    };

    if let Some(path) = &cli.output {
        let rows = body_rows(&trajectory, &names);
        write_csv(writer_for_path(path)?, &rows)
            .with_context(|| format!("writing body states to {}", path.display()))?;
        info!("wrote {} body rows to {}", rows.len(), path.display());
    }

    if cli.output.as_deref() == Some(Path::new("-")) {
        return Ok(());
    }

    let stats = trajectory.stats();
    println!("=== Propagation ===");
    println!("Bodies      : {}", names.join(", "));
    println!(
        "Span        : {:.2} days",
        trajectory.last().t / SECONDS_PER_DAY
    );
    println!(
        "Steps       : {} accepted, {} rejected, {} forced",
        stats.accepted, stats.rejected, stats.forced
    );
    let last = &trajectory.last().state;
    for (index, name) in names.iter().enumerate() {
        let radius = vector::norm(&body_position(last, index));
        println!("{:<12}: r = {:.6} AU", name, radius / AU_M);
    }
    if let Some((a, b, approach)) = approach {
        println!(
            "Closest     : {} - {} = {:.6e} km at day {:.2}",
            names[a],
            names[b],
            approach.distance / 1_000.0,
            approach.t / SECONDS_PER_DAY
        );
    }

    Ok(())
}
