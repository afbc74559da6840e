//! Time-stamped state history produced by a solver run.

/// One accepted step: time, state, and the local error estimate of the step that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryRow {
    pub t: f64,
    pub state: Vec<f64>,
    /// Local error estimate of the producing step (0 for the initial row and fixed-step solvers).
    pub error_estimate: f64,
    /// Set when an adaptive step exhausted its retries and was accepted above tolerance.
    pub forced: bool,
}

impl TrajectoryRow {
    pub fn new(t: f64, state: Vec<f64>) -> Self {
        Self {
            t,
            state,
            error_estimate: 0.0,
            forced: false,
        }
    }

    /// Plain `[t, state...]` row for external consumers.
    pub fn to_vec(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.state.len() + 1);
        row.push(self.t);
        row.extend_from_slice(&self.state);
        row
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The stop predicate fired after the last row.
    StopCondition,
    /// `max_steps` accepted steps were taken without the stop predicate firing.
    MaxSteps,
}

/// Solver bookkeeping for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    pub accepted: usize,
    pub rejected: usize,
    pub forced: usize,
    pub rhs_evaluations: usize,
}

/// Append-only sequence of `(t, state)` rows; the first row is always the initial condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    rows: Vec<TrajectoryRow>,
    termination: Termination,
    stats: SolveStats,
}

impl Trajectory {
    pub(crate) fn start(t0: f64, y0: &[f64]) -> Self {
        Self {
            rows: vec![TrajectoryRow::new(t0, y0.to_vec())],
            termination: Termination::MaxSteps,
            stats: SolveStats::default(),
        }
    }

    pub(crate) fn push(&mut self, row: TrajectoryRow) {
        self.rows.push(row);
    }

    pub(crate) fn finish(mut self, termination: Termination, stats: SolveStats) -> Self {
        self.termination = termination;
        self.stats = stats;
        self
    }

    pub fn rows(&self) -> &[TrajectoryRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<TrajectoryRow> {
        self.rows
    }

    /// Number of rows, including the initial condition.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false: a trajectory holds at least its initial row.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of accepted steps (rows after the initial one).
    pub fn steps(&self) -> usize {
        self.rows.len() - 1
    }

    pub fn initial(&self) -> &TrajectoryRow {
        &self.rows[0]
    }

    pub fn last(&self) -> &TrajectoryRow {
        &self.rows[self.rows.len() - 1]
    }

    pub fn final_state(&self) -> &[f64] {
        &self.last().state
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    /// True when the run hit `max_steps` before the stop predicate fired.
    pub fn timed_out(&self) -> bool {
        self.termination == Termination::MaxSteps
    }

    pub fn times(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.t).collect()
    }

    /// Values of one state component across all rows.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row.state[index]).collect()
    }
}
