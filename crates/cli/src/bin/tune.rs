use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use descent_cli::{info, tuning_summary};
use descent_sim::descent::{TuningMethod, tune_gains};
use descent_sim::export::summary::write_json;
use descent_sim::scenario::load_scenario;

/// Tune the feedback gains of a descent scenario for the lowest landing cost.
#[derive(Parser, Debug)]
#[command(author, version, about = "Feedback gain tuner")]
struct Cli {
    /// Scenario file (YAML or TOML); its optimizer section sets bounds and budgets
    #[arg(long, default_value = "configs/titan_descent.yaml")]
    config: PathBuf,

    #[arg(long, value_enum, default_value_t = MethodArg::Genetic)]
    method: MethodArg,

    /// Override the genetic algorithm seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of generations or iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// JSON summary output
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum MethodArg {
    Genetic,
    Gradient,
}

impl From<MethodArg> for TuningMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Genetic => TuningMethod::Genetic,
            MethodArg::Gradient => TuningMethod::Gradient,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut scenario = load_scenario(&cli.config)
        .with_context(|| format!("loading scenario {}", cli.config.display()))?;
    if let Some(iterations) = cli.iterations {
        scenario.tuning.genetic.generations = iterations;
        scenario.tuning.gradient.max_iterations = iterations;
    }

    let method = TuningMethod::from(cli.method);
    info!(
        "tuning `{}` ({} controller) with {}",
        scenario.name,
        scenario.controller.label(),
        method.label()
    );
    let outcome = tune_gains(&scenario, method, cli.seed)?;
    for (index, best) in outcome.history.iter().enumerate() {
        info!("{} {:>3}: best cost {:.6}", method.label(), index, best);
    }

    if let Some(path) = &cli.summary {
        write_json(path, &tuning_summary(&scenario.name, &outcome))
            .with_context(|| format!("writing summary to {}", path.display()))?;
        info!("wrote summary to {}", path.display());
    }

    let gains = outcome.gains;
    println!("=== Tuned Gains ===");
    println!("Scenario    : {}", scenario.name);
    println!("Method      : {}", method.label());
    println!("kp_y        : {:.6e}", gains.kp_y);
    println!("kd_y        : {:.6e}", gains.kd_y);
    println!("kp_x        : {:.6e}", gains.kp_x);
    println!("kd_x        : {:.6e}", gains.kd_x);
    println!("kp_theta    : {:.6}", gains.kp_theta);
    println!("kd_theta    : {:.6}", gains.kd_theta);
    println!("Best cost   : {:.6}", outcome.fitness);
    println!("Evaluations : {}", outcome.evaluations);
    if let Some(speed) = outcome.summary.and_then(|summary| summary.touchdown_speed) {
        println!("Touchdown   : |vy| = {:.3} m/s", speed);
    }

    Ok(())
}
