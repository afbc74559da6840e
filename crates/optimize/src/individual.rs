/// Compact record of the simulation behind a fitness value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrajectorySummary {
    pub final_time: f64,
    pub steps: usize,
    pub timed_out: bool,
    /// Closest approach to a target body (m), for transfer problems.
    pub min_distance: Option<f64>,
    /// Vertical speed at touchdown (m/s), for descent problems.
    pub touchdown_speed: Option<f64>,
}

/// Result of one fitness evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub fitness: f64,
    pub summary: Option<TrajectorySummary>,
}

impl Evaluation {
    pub fn new(fitness: f64) -> Self {
        Self {
            fitness,
            summary: None,
        }
    }

    pub fn with_summary(fitness: f64, summary: TrajectorySummary) -> Self {
        Self {
            fitness,
            summary: Some(summary),
        }
    }
}

/// Deterministic map from a parameter vector to a fitness, lower is better.
///
/// `Sync` because evaluations of one generation run concurrently against a shared reference.
pub trait FitnessFunction: Sync {
    fn evaluate(&self, genes: &[f64]) -> Evaluation;
}

impl<F> FitnessFunction for F
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    fn evaluate(&self, genes: &[f64]) -> Evaluation {
        Evaluation::new(self(genes))
    }
}

/// Parameter vector with a lazily computed, cached fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    genes: Vec<f64>,
    fitness: Option<f64>,
    summary: Option<TrajectorySummary>,
}

impl Individual {
    pub fn new(genes: Vec<f64>) -> Self {
        Self {
            genes,
            fitness: None,
            summary: None,
        }
    }

    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    pub fn into_genes(self) -> Vec<f64> {
        self.genes
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn summary(&self) -> Option<&TrajectorySummary> {
        self.summary.as_ref()
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Ranking score; unevaluated and non-finite individuals rank last.
    pub fn score(&self) -> f64 {
        self.fitness.map_or(f64::INFINITY, crate::ranking_score)
    }

    /// Replace one gene, invalidating the cached evaluation.
    pub fn set_gene(&mut self, index: usize, value: f64) {
        self.genes[index] = value;
        self.fitness = None;
        self.summary = None;
    }

    /// Evaluate unless a cached fitness exists. Returns true when the function was called.
    pub fn evaluate_with<F: FitnessFunction + ?Sized>(&mut self, fitness: &F) -> bool {
        if self.is_evaluated() {
            return false;
        }
        let evaluation = fitness.evaluate(&self.genes);
        self.fitness = Some(evaluation.fitness);
        self.summary = evaluation.summary;
        true
    }
}
