//! Projected gradient descent with central finite differences.

use rayon::prelude::*;

use crate::bounds::Bounds;
use crate::individual::{Evaluation, FitnessFunction, TrajectorySummary};
use crate::{OptimizeError, ranking_score, require_positive};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientConfig {
    pub learning_rate: f64,
    /// Finite-difference half-width as a fraction of each parameter's bound width.
    pub finite_difference_step: f64,
    pub max_iterations: usize,
    /// Stop once the gradient norm falls below this.
    pub tolerance: f64,
    /// Step halvings tried before giving up on an iteration.
    pub max_backtracks: usize,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            finite_difference_step: 1e-6,
            max_iterations: 100,
            tolerance: 1e-8,
            max_backtracks: 20,
        }
    }
}

impl GradientConfig {
    fn validate(&self) -> Result<(), OptimizeError> {
        require_positive("learning_rate", self.learning_rate)?;
        require_positive("finite_difference_step", self.finite_difference_step)?;
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(OptimizeError::InvalidParameter {
                name: "tolerance",
                value: self.tolerance,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationStats {
    pub iteration: usize,
    /// Fitness after the iteration's update.
    pub fitness: f64,
    pub gradient_norm: f64,
    /// Step length accepted after backtracking; zero when no step improved.
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientResult {
    pub parameters: Vec<f64>,
    pub fitness: f64,
    pub summary: Option<TrajectorySummary>,
    pub iterations: usize,
    /// True when the gradient norm dropped below the tolerance or no descent step improved.
    pub converged: bool,
    pub history: Vec<IterationStats>,
    pub evaluations: usize,
}

#[derive(Debug, Clone)]
pub struct GradientDescent {
    bounds: Bounds,
    config: GradientConfig,
}

impl GradientDescent {
    pub fn new(bounds: Bounds, config: GradientConfig) -> Result<Self, OptimizeError> {
        config.validate()?;
        Ok(Self { bounds, config })
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn config(&self) -> &GradientConfig {
        &self.config
    }

    /// Minimise `fitness` from `start`, which is first projected onto the bounds.
    pub fn run<F: FitnessFunction + ?Sized>(
        &self,
        fitness: &F,
        start: &[f64],
    ) -> Result<GradientResult, OptimizeError> {
        self.bounds.check_dimension(start)?;
        let mut x = start.to_vec();
        self.bounds.project(&mut x);

        let mut current = score(fitness.evaluate(&x));
        let mut evaluations = 1;
        let mut history = Vec::new();
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            iterations += 1;
            let (gradient, performed) = self.gradient(fitness, &x);
            evaluations += performed;
            let norm = gradient.iter().map(|g| g * g).sum::<f64>().sqrt();
            if norm < self.config.tolerance {
                converged = true;
                history.push(IterationStats {
                    iteration: iterations,
                    fitness: current.fitness,
                    gradient_norm: norm,
                    step: 0.0,
                });
                break;
            }

            let mut step = self.config.learning_rate;
            let mut accepted = None;
            for _ in 0..=self.config.max_backtracks {
                let mut candidate: Vec<f64> =
                    x.iter().zip(&gradient).map(|(xi, gi)| xi - step * gi).collect();
                self.bounds.project(&mut candidate);
                let trial = score(fitness.evaluate(&candidate));
                evaluations += 1;
                if trial.fitness < current.fitness {
                    accepted = Some((candidate, trial));
                    break;
                }
                step *= 0.5;
            }

            match accepted {
                Some((candidate, trial)) => {
                    x = candidate;
                    current = trial;
                    history.push(IterationStats {
                        iteration: iterations,
                        fitness: current.fitness,
                        gradient_norm: norm,
                        step,
                    });
                }
                None => {
                    converged = true;
                    history.push(IterationStats {
                        iteration: iterations,
                        fitness: current.fitness,
                        gradient_norm: norm,
                        step: 0.0,
                    });
                    break;
                }
            }
        }

        Ok(GradientResult {
            parameters: x,
            fitness: current.fitness,
            summary: current.summary,
            iterations,
            converged,
            history,
            evaluations,
        })
    }

    /// Central-difference gradient, one parallel task per component. Returns the gradient and
    /// the number of evaluations spent.
    fn gradient<F: FitnessFunction + ?Sized>(&self, fitness: &F, x: &[f64]) -> (Vec<f64>, usize) {
        let (gradient, counts): (Vec<f64>, Vec<usize>) = (0..x.len())
            .into_par_iter()
            .map(|index| {
                let offset = self.config.finite_difference_step * self.bounds.width(index);
                let plus = self.bounds.clamp_gene(index, x[index] + offset);
                let minus = self.bounds.clamp_gene(index, x[index] - offset);
                let span = plus - minus;
                if span <= 0.0 {
                    return (0.0, 0);
                }
                let mut probe = x.to_vec();
                probe[index] = plus;
                let upper = ranking_score(fitness.evaluate(&probe).fitness);
                probe[index] = minus;
                let lower = ranking_score(fitness.evaluate(&probe).fitness);
                let slope = (upper - lower) / span;
                (if slope.is_finite() { slope } else { 0.0 }, 2)
            })
            .unzip();
        (gradient, counts.into_iter().sum())
    }
}

fn score(evaluation: Evaluation) -> Evaluation {
    Evaluation {
        fitness: ranking_score(evaluation.fitness),
        summary: evaluation.summary,
    }
}
