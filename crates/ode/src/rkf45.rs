//! Runge-Kutta-Fehlberg 4(5) with adaptive step-size control.
//!
//! Six stage evaluations yield both a fourth- and a fifth-order estimate. The local error is the
//! max-norm of their difference; steps within tolerance advance with the fifth-order solution,
//! steps above it are retried from the same `(t, y)` with a smaller step.
//!
//! After `max_retries` consecutive rejections, or when the next step would drop below
//! `min_step`, the last attempt is accepted anyway and its row is flagged `forced`.

use crate::system::{OdeSystem, StopFn};
use crate::trajectory::{SolveStats, Termination, Trajectory, TrajectoryRow};
use crate::{IntegrationError, Integrator, validate_inputs};

const STAGES: usize = 6;

const C: [f64; STAGES] = [0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0];

const A: [[f64; 5]; STAGES] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 4.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 32.0, 9.0 / 32.0, 0.0, 0.0, 0.0],
    [1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0, 0.0, 0.0],
    [439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0, 0.0],
    [
        -8.0 / 27.0,
        2.0,
        -3544.0 / 2565.0,
        1859.0 / 4104.0,
        -11.0 / 40.0,
    ],
];

/// Fourth-order weights.
const B4: [f64; STAGES] = [
    25.0 / 216.0,
    0.0,
    1408.0 / 2565.0,
    2197.0 / 4104.0,
    -1.0 / 5.0,
    0.0,
];

/// Fifth-order weights.
const B5: [f64; STAGES] = [
    16.0 / 135.0,
    0.0,
    6656.0 / 12825.0,
    28561.0 / 56430.0,
    -9.0 / 50.0,
    2.0 / 55.0,
];

/// Outcome of a single trial step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepAttempt {
    /// Step size used for this attempt.
    pub h: f64,
    pub t_next: f64,
    /// Fifth-order solution at `t_next`.
    pub y_next: Vec<f64>,
    /// Max-norm of `y5 - y4`.
    pub error: f64,
    pub accepted: bool,
    /// Suggested step size for the next attempt (smaller than `h` after a rejection).
    pub h_next: f64,
}

/// Adaptive RKF45 integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rkf45 {
    /// Absolute local-error tolerance on the max-norm of `y5 - y4`.
    pub tolerance: f64,
    /// Safety factor applied to the optimal step ratio, in (0, 1).
    pub safety: f64,
    /// Largest ratio `h_next / h` after an accepted step.
    pub max_growth: f64,
    /// Smallest ratio `h_next / h` after a rejected step, in (0, 1).
    pub min_shrink: f64,
    /// Consecutive rejections tolerated before a step is forced through.
    pub max_retries: usize,
    /// Floor below which the step is forced through instead of shrunk further.
    pub min_step: f64,
    /// Optional cap on the step size.
    pub max_step: Option<f64>,
}

impl Default for Rkf45 {
    fn default() -> Self {
        Self::new(1e-6)
    }
}

impl Rkf45 {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            safety: 0.9,
            max_growth: 4.0,
            min_shrink: 0.1,
            max_retries: 25,
            min_step: 1e-12,
            max_step: None,
        }
    }

    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = Some(max_step);
        self
    }

    pub fn with_min_step(mut self, min_step: f64) -> Self {
        self.min_step = min_step;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn validate(&self) -> Result<(), IntegrationError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(IntegrationError::InvalidTolerance(self.tolerance));
        }
        if !(self.safety > 0.0 && self.safety < 1.0) {
            return Err(IntegrationError::InvalidStepControl(
                "safety factor must lie in (0, 1)",
            ));
        }
        if !(self.min_shrink > 0.0 && self.min_shrink < 1.0) {
            return Err(IntegrationError::InvalidStepControl(
                "minimum shrink ratio must lie in (0, 1)",
            ));
        }
        if !(self.max_growth.is_finite() && self.max_growth >= 1.0) {
            return Err(IntegrationError::InvalidStepControl(
                "maximum growth ratio must be at least 1",
            ));
        }
        if !(self.min_step.is_finite() && self.min_step >= 0.0) {
            return Err(IntegrationError::InvalidStepControl(
                "minimum step must be finite and non-negative",
            ));
        }
        if let Some(max_step) = self.max_step {
            if !(max_step.is_finite() && max_step > 0.0) {
                return Err(IntegrationError::InvalidStepControl(
                    "maximum step must be positive and finite",
                ));
            }
        }
        Ok(())
    }

    /// Step ratio `safety * (tol / err)^(1/5)`, clamped to `[min_shrink, max_growth]`.
    fn step_factor(&self, error: f64) -> f64 {
        if error == 0.0 {
            return self.max_growth;
        }
        let factor = self.safety * (self.tolerance / error).powf(0.2);
        if factor.is_nan() {
            return self.min_shrink;
        }
        factor.clamp(self.min_shrink, self.max_growth)
    }

    fn cap(&self, h: f64) -> f64 {
        match self.max_step {
            Some(max_step) => h.min(max_step),
            None => h,
        }
    }

    /// Take one trial step of size `h` from `(t, y)` without committing it.
    pub fn attempt<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t: f64,
        y: &[f64],
        h: f64,
    ) -> StepAttempt {
        let n = y.len();
        let mut k = [
            vec![0.0; n],
            vec![0.0; n],
            vec![0.0; n],
            vec![0.0; n],
            vec![0.0; n],
            vec![0.0; n],
        ];
        let mut stage = vec![0.0; n];

        system.rhs(t, y, &mut k[0]);
        for s in 1..STAGES {
            let (computed, pending) = k.split_at_mut(s);
            for i in 0..n {
                let sum: f64 = computed
                    .iter()
                    .enumerate()
                    .map(|(j, kj)| A[s][j] * kj[i])
                    .sum();
                stage[i] = y[i] + h * sum;
            }
            system.rhs(t + C[s] * h, &stage, &mut pending[0]);
        }

        let mut y_next = vec![0.0; n];
        let mut error: f64 = 0.0;
        for i in 0..n {
            let mut sum4 = 0.0;
            let mut sum5 = 0.0;
            for s in 0..STAGES {
                sum4 += B4[s] * k[s][i];
                sum5 += B5[s] * k[s][i];
            }
            let y4 = y[i] + h * sum4;
            let y5 = y[i] + h * sum5;
            y_next[i] = y5;
            let diff = (y5 - y4).abs();
            error = if diff.is_nan() { f64::INFINITY } else { error.max(diff) };
        }

        let accepted = error <= self.tolerance;
        let h_next = self.cap(h * self.step_factor(error));

        StepAttempt {
            h,
            t_next: t + h,
            y_next,
            error,
            accepted,
            h_next,
        }
    }
}

impl Integrator for Rkf45 {
    /// `step` is the initial trial step; subsequent steps adapt.
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
        self.validate()?;

        let mut trajectory = Trajectory::start(t0, y0);
        let mut stats = SolveStats::default();
        let mut termination = Termination::MaxSteps;

        let mut t = t0;
        let mut y = y0.to_vec();
        let mut h = self.cap(step);

        while stats.accepted + stats.forced < max_steps {
            let mut retries = 0usize;
            let row = loop {
                let attempt = self.attempt(system, t, &y, h);
                stats.rhs_evaluations += STAGES;

                if attempt.accepted {
                    stats.accepted += 1;
                    h = attempt.h_next;
                    break TrajectoryRow {
                        t: attempt.t_next,
                        state: attempt.y_next,
                        error_estimate: attempt.error,
                        forced: false,
                    };
                }

                stats.rejected += 1;
                retries += 1;
                if retries > self.max_retries || attempt.h_next < self.min_step {
                    stats.forced += 1;
                    h = attempt.h_next.max(self.min_step).max(f64::MIN_POSITIVE);
                    break TrajectoryRow {
                        t: attempt.t_next,
                        state: attempt.y_next,
                        error_estimate: attempt.error,
                        forced: true,
                    };
                }
                h = attempt.h_next;
            };

            t = row.t;
            y.clone_from(&row.state);
            trajectory.push(row);

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
