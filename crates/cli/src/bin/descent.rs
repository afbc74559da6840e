use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use descent_cli::{descent_summary, info, lander_rows, warn};
use descent_sim::descent::simulate_descent;
use descent_sim::export::summary::write_json;
use descent_sim::export::trajectory::write_csv;
use descent_sim::export::writer_for_path;
use descent_sim::scenario::{ControllerKind, load_scenario};

/// Fly a lander descent scenario and classify the touchdown.
#[derive(Parser, Debug)]
#[command(author, version, about = "Lander descent simulator")]
struct Cli {
    /// Scenario file (YAML or TOML)
    #[arg(long, default_value = "configs/titan_descent.yaml")]
    config: PathBuf,

    /// Fly this controller instead of the one in the scenario
    #[arg(long, value_enum)]
    controller: Option<ControllerArg>,

    /// Trajectory CSV output (use '-' for stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON summary output
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum ControllerArg {
    Feedback,
    OpenLoop,
    Combined,
}

impl From<ControllerArg> for ControllerKind {
    fn from(value: ControllerArg) -> Self {
        match value {
            ControllerArg::Feedback => ControllerKind::Feedback,
            ControllerArg::OpenLoop => ControllerKind::OpenLoop,
            ControllerArg::Combined => ControllerKind::Combined,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut scenario = load_scenario(&cli.config)
        .with_context(|| format!("loading scenario {}", cli.config.display()))?;
    if let Some(controller) = cli.controller {
        scenario.controller = controller.into();
    }

    info!(
        "flying `{}` with the {} controller",
        scenario.name,
        scenario.controller.label()
    );
    let report = simulate_descent(&scenario)?;
    if report.touchdown.timed_out {
        warn!(
            "step limit of {} reached before touchdown",
            scenario.integrator.max_steps
        );
    }

    if let Some(path) = &cli.output {
        let rows = lander_rows(&report);
        write_csv(writer_for_path(path)?, &rows)
            .with_context(|| format!("writing trajectory to {}", path.display()))?;
        info!("wrote {} trajectory rows to {}", rows.len(), path.display());
    }
    if let Some(path) = &cli.summary {
        write_json(path, &descent_summary(&scenario.name, &report))
            .with_context(|| format!("writing summary to {}", path.display()))?;
        info!("wrote summary to {}", path.display());
    }

    // Keep stdout clean when it carries the CSV.
    if cli.output.as_deref() == Some(Path::new("-")) {
        return Ok(());
    }

    let state = report.touchdown.state;
    println!("=== Descent Report ===");
    println!("Scenario       : {}", scenario.name);
    println!("Controller     : {}", report.controller);
    println!("Steps          : {}", report.steps());
    println!("Touchdown time : {:.2} s", report.touchdown.time);
    println!(
        "Final position : x = {:.3} m, y = {:.3} m",
        state.x, state.y
    );
    println!(
        "Final velocity : vx = {:.3} m/s, vy = {:.3} m/s",
        state.vx, state.vy
    );
    println!(
        "Attitude       : theta = {:.4} rad, omega = {:.4} rad/s",
        state.theta, state.omega
    );
    println!("Outcome        : {}", report.outcome().label());

    Ok(())
}
