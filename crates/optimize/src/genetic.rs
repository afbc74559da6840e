//! Generational genetic algorithm: tournament selection, blend crossover, approximately
//! Gaussian mutation, elitism.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::bounds::Bounds;
use crate::individual::{FitnessFunction, Individual};
use crate::{OptimizeError, require_positive};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneticConfig {
    pub population_size: usize,
    /// Generations bred after the initial population.
    pub generations: usize,
    /// Best individuals copied unchanged into the next generation.
    pub elite_count: usize,
    pub tournament_size: usize,
    /// Probability that a child is bred by crossover rather than cloned from one parent.
    pub crossover_rate: f64,
    /// BLX-α extension of the parents' interval on each side.
    pub blend_alpha: f64,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    /// Mutation standard deviation as a fraction of the gene's bound width.
    pub mutation_scale: f64,
    pub seed: u64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 40,
            generations: 30,
            elite_count: 2,
            tournament_size: 3,
            crossover_rate: 0.9,
            blend_alpha: 0.5,
            mutation_rate: 0.2,
            mutation_scale: 0.1,
            seed: 42,
        }
    }
}

impl GeneticConfig {
    fn validate(&self) -> Result<(), OptimizeError> {
        if self.population_size < 2 {
            return Err(OptimizeError::InvalidPopulation(self.population_size));
        }
        if self.elite_count >= self.population_size {
            return Err(OptimizeError::InvalidElite {
                elite: self.elite_count,
                population: self.population_size,
            });
        }
        if self.tournament_size == 0 || self.tournament_size > self.population_size {
            return Err(OptimizeError::InvalidTournament {
                size: self.tournament_size,
                population: self.population_size,
            });
        }
        for (name, value) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(OptimizeError::InvalidProbability { name, value });
            }
        }
        if !(self.blend_alpha.is_finite() && self.blend_alpha >= 0.0) {
            return Err(OptimizeError::InvalidParameter {
                name: "blend_alpha",
                value: self.blend_alpha,
            });
        }
        require_positive("mutation_scale", self.mutation_scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    pub generation: usize,
    pub best: f64,
    /// Mean over finite fitness values; infinite when none are finite.
    pub mean: f64,
    /// Fitness evaluations performed for this generation.
    pub evaluations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneticResult {
    pub best: Individual,
    pub history: Vec<GenerationStats>,
    /// Final population, best first.
    pub population: Vec<Individual>,
    pub evaluations: usize,
}

#[derive(Debug, Clone)]
pub struct GeneticAlgorithm {
    bounds: Bounds,
    config: GeneticConfig,
}

impl GeneticAlgorithm {
    pub fn new(bounds: Bounds, config: GeneticConfig) -> Result<Self, OptimizeError> {
        config.validate()?;
        Ok(Self { bounds, config })
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    pub fn run<F: FitnessFunction + ?Sized>(&self, fitness: &F) -> GeneticResult {
        self.evolve(fitness, Vec::new())
    }

    /// Run with `seeds` placed in the initial population (projected onto the bounds); the rest
    /// is sampled uniformly. Every seed must match the bounds' dimension.
    pub fn run_from<F: FitnessFunction + ?Sized>(
        &self,
        fitness: &F,
        seeds: Vec<Vec<f64>>,
    ) -> Result<GeneticResult, OptimizeError> {
        for seed in &seeds {
            self.bounds.check_dimension(seed)?;
        }
        Ok(self.evolve(fitness, seeds))
    }

    fn evolve<F: FitnessFunction + ?Sized>(
        &self,
        fitness: &F,
        seeds: Vec<Vec<f64>>,
    ) -> GeneticResult {
        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        let size = self.config.population_size;

        let mut population: Vec<Individual> = seeds
            .into_iter()
            .take(size)
            .map(|mut genes| {
                self.bounds.project(&mut genes);
                Individual::new(genes)
            })
            .collect();
        while population.len() < size {
            population.push(Individual::new(self.bounds.sample(&mut rng)));
        }

        let mut history = Vec::with_capacity(self.config.generations + 1);
        let mut evaluations = evaluate_population(&mut population, fitness);
        rank(&mut population);
        history.push(stats(0, &population, evaluations));

        for generation in 1..=self.config.generations {
            let mut next: Vec<Individual> = population[..self.config.elite_count].to_vec();
            while next.len() < size {
                let a = self.tournament(&population, &mut rng);
                let b = self.tournament(&population, &mut rng);
                let mut child = if rng.random_bool(self.config.crossover_rate) {
                    self.blend(&population[a], &population[b], &mut rng)
                } else {
                    population[a].clone()
                };
                self.mutate(&mut child, &mut rng);
                next.push(child);
            }
            population = next;

            let performed = evaluate_population(&mut population, fitness);
            evaluations += performed;
            rank(&mut population);
            history.push(stats(generation, &population, performed));
        }

        GeneticResult {
            best: population[0].clone(),
            history,
            population,
            evaluations,
        }
    }

    /// Index of the best of `tournament_size` uniformly drawn contestants.
    fn tournament<R: Rng + ?Sized>(&self, population: &[Individual], rng: &mut R) -> usize {
        let mut winner = rng.random_range(0..population.len());
        for _ in 1..self.config.tournament_size {
            let challenger = rng.random_range(0..population.len());
            if population[challenger].score() < population[winner].score() {
                winner = challenger;
            }
        }
        winner
    }

    /// BLX-α: each child gene is drawn from the parents' interval widened by α on both sides.
    fn blend<R: Rng + ?Sized>(&self, a: &Individual, b: &Individual, rng: &mut R) -> Individual {
        let alpha = self.config.blend_alpha;
        let genes = a
            .genes()
            .iter()
            .zip(b.genes())
            .enumerate()
            .map(|(index, (&ga, &gb))| {
                let (lo, hi) = if ga <= gb { (ga, gb) } else { (gb, ga) };
                let spread = alpha * (hi - lo);
                let value = rng.random_range((lo - spread)..=(hi + spread));
                self.bounds.clamp_gene(index, value)
            })
            .collect();
        Individual::new(genes)
    }

    fn mutate<R: Rng + ?Sized>(&self, individual: &mut Individual, rng: &mut R) {
        for index in 0..self.bounds.len() {
            if !rng.random_bool(self.config.mutation_rate) {
                continue;
            }
            let sigma = self.config.mutation_scale * self.bounds.width(index);
            let value = individual.genes()[index] + sigma * standard_normal(rng);
            individual.set_gene(index, self.bounds.clamp_gene(index, value));
        }
    }
}

/// Irwin-Hall approximation of a standard normal draw: twelve uniforms minus six.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (0..12).map(|_| rng.random::<f64>()).sum::<f64>() - 6.0
}

/// Evaluate every individual without a cached fitness, in parallel.
fn evaluate_population<F: FitnessFunction + ?Sized>(
    population: &mut [Individual],
    fitness: &F,
) -> usize {
    population
        .par_iter_mut()
        .map(|individual| usize::from(individual.evaluate_with(fitness)))
        .sum()
}

/// Stable sort, best first.
fn rank(population: &mut [Individual]) {
    population.sort_by(|a, b| a.score().total_cmp(&b.score()));
}

fn stats(generation: usize, ranked: &[Individual], evaluations: usize) -> GenerationStats {
    let finite: Vec<f64> = ranked
        .iter()
        .map(Individual::score)
        .filter(|score| score.is_finite())
        .collect();
    let mean = if finite.is_empty() {
        f64::INFINITY
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    };
    GenerationStats {
        generation,
        best: ranked.first().map_or(f64::INFINITY, Individual::score),
        mean,
        evaluations,
    }
}
