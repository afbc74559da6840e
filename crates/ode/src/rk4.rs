//! Classical fixed-step fourth-order Runge-Kutta.

use crate::system::{OdeSystem, StopFn};
use crate::trajectory::{SolveStats, Termination, Trajectory, TrajectoryRow};
use crate::{IntegrationError, Integrator, validate_inputs};

/// Advance `y` by one RK4 step of size `h` starting at `t`.
///
/// Exposed separately so callers can interleave external updates (for example an N-body
/// engine advancing other bodies) between steps.
pub fn rk4_step<S: OdeSystem + ?Sized>(system: &S, t: f64, y: &[f64], h: f64) -> Vec<f64> {
    let n = y.len();
    let half = 0.5 * h;

    let mut k1 = vec![0.0; n];
    let mut k2 = vec![0.0; n];
    let mut k3 = vec![0.0; n];
    let mut k4 = vec![0.0; n];
    let mut stage = vec![0.0; n];

    system.rhs(t, y, &mut k1);

    for i in 0..n {
        stage[i] = y[i] + half * k1[i];
    }
    system.rhs(t + half, &stage, &mut k2);

    for i in 0..n {
        stage[i] = y[i] + half * k2[i];
    }
    system.rhs(t + half, &stage, &mut k3);

    for i in 0..n {
        stage[i] = y[i] + h * k3[i];
    }
    system.rhs(t + h, &stage, &mut k4);

    (0..n)
        .map(|i| y[i] + h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
        .collect()
}

/// Fixed-step RK4 integrator. The step size passed to `solve` is used unchanged for the whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4;

impl Integrator for Rk4 {
    fn solve<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t0: f64,
        y0: &[f64],
        step: f64,
        max_steps: usize,
        stop: Option<&StopFn<'_>>,
    ) -> Result<Trajectory, IntegrationError> {
        validate_inputs(system, y0, step, max_steps)?;

        let mut trajectory = Trajectory::start(t0, y0);
        let mut stats = SolveStats::default();
        let mut termination = Termination::MaxSteps;

        let mut t = t0;
        let mut y = y0.to_vec();
        for _ in 0..max_steps {
            y = rk4_step(system, t, &y, step);
            t += step;
            stats.accepted += 1;
            stats.rhs_evaluations += 4;
            trajectory.push(TrajectoryRow::new(t, y.clone()));

            if let Some(stop) = stop {
                if stop(t, &y) {
                    termination = Termination::StopCondition;
                    break;
                }
            }
        }

        Ok(trajectory.finish(termination, stats))
    }
}
