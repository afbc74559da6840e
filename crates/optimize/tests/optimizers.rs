use descent_optimize::{
    Bounds, Evaluation, FitnessFunction, GeneticAlgorithm, GeneticConfig, GradientConfig,
    GradientDescent, Individual, OptimizeError, TrajectorySummary, ranking_score,
};

fn shifted_sphere(genes: &[f64]) -> f64 {
    (genes[0] - 1.0).powi(2) + (genes[1] + 2.0).powi(2)
}

fn square_box(half_width: f64, dimension: usize) -> Bounds {
    Bounds::new(vec![(-half_width, half_width); dimension]).expect("valid bounds")
}

struct Summarised;

impl FitnessFunction for Summarised {
    fn evaluate(&self, genes: &[f64]) -> Evaluation {
        Evaluation::with_summary(
            genes[0].abs(),
            TrajectorySummary {
                min_distance: Some(genes[0].abs()),
                ..TrajectorySummary::default()
            },
        )
    }
}

#[test]
fn bounds_reject_inverted_and_empty_ranges() {
    assert_eq!(Bounds::new(Vec::new()), Err(OptimizeError::EmptyBounds));
    assert!(matches!(
        Bounds::new(vec![(0.0, 1.0), (2.0, 1.0)]),
        Err(OptimizeError::InvalidBound { index: 1, .. })
    ));
    assert!(Bounds::new(vec![(0.0, f64::INFINITY)]).is_err());
}

#[test]
fn bounds_project_and_contain() {
    let bounds = Bounds::new(vec![(0.0, 1.0), (-2.0, 2.0)]).expect("bounds");
    let mut values = [1.5, -3.0];
    assert!(!bounds.contains(&values));
    bounds.project(&mut values);
    assert_eq!(values, [1.0, -2.0]);
    assert!(bounds.contains(&values));
    assert!(!bounds.contains(&[0.5]));
    assert_eq!(
        bounds.check_dimension(&[0.5]),
        Err(OptimizeError::DimensionMismatch {
            expected: 2,
            actual: 1
        })
    );
}

#[test]
fn individual_caches_until_a_gene_changes() {
    let counter = std::sync::atomic::AtomicUsize::new(0);
    let counted = |genes: &[f64]| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        genes[0]
    };
    let mut individual = Individual::new(vec![3.0]);
    assert!(!individual.is_evaluated());
    assert_eq!(individual.score(), f64::INFINITY);

    assert!(individual.evaluate_with(&counted));
    assert!(!individual.evaluate_with(&counted));
    assert_eq!(individual.fitness(), Some(3.0));

    individual.set_gene(0, 2.0);
    assert_eq!(individual.fitness(), None);
    assert!(individual.evaluate_with(&counted));
    assert_eq!(individual.fitness(), Some(2.0));
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[test]
fn non_finite_fitness_ranks_last() {
    assert_eq!(ranking_score(f64::NAN), f64::INFINITY);
    assert_eq!(ranking_score(f64::NEG_INFINITY), f64::INFINITY);
    assert_eq!(ranking_score(-4.0), -4.0);
}

#[test]
fn genetic_config_is_validated() {
    let bounds = square_box(1.0, 2);
    let reject = |config: GeneticConfig| GeneticAlgorithm::new(bounds.clone(), config).is_err();
    let base = GeneticConfig::default();

    assert!(reject(GeneticConfig {
        population_size: 1,
        ..base
    }));
    assert!(reject(GeneticConfig {
        elite_count: base.population_size,
        ..base
    }));
    assert!(reject(GeneticConfig {
        tournament_size: 0,
        ..base
    }));
    assert!(reject(GeneticConfig {
        crossover_rate: 1.5,
        ..base
    }));
    assert!(reject(GeneticConfig {
        mutation_rate: -0.1,
        ..base
    }));
    assert!(reject(GeneticConfig {
        mutation_scale: 0.0,
        ..base
    }));
    assert!(GeneticAlgorithm::new(bounds, base).is_ok());
}

#[test]
fn genetic_algorithm_finds_the_sphere_minimum() {
    let ga = GeneticAlgorithm::new(square_box(5.0, 2), GeneticConfig::default()).expect("ga");
    let result = ga.run(&shifted_sphere);

    let best = result.best.genes();
    assert!(
        result.best.score() < 0.1,
        "best fitness {} at {:?}",
        result.best.score(),
        best
    );
    assert!((best[0] - 1.0).abs() < 0.4 && (best[1] + 2.0).abs() < 0.4);
    assert_eq!(result.history.len(), GeneticConfig::default().generations + 1);
}

#[test]
fn genetic_algorithm_is_reproducible_per_seed() {
    let config = GeneticConfig {
        generations: 10,
        ..GeneticConfig::default()
    };
    let first = GeneticAlgorithm::new(square_box(5.0, 2), config)
        .expect("ga")
        .run(&shifted_sphere);
    let second = GeneticAlgorithm::new(square_box(5.0, 2), config)
        .expect("ga")
        .run(&shifted_sphere);
    assert_eq!(first, second);

    let other = GeneticAlgorithm::new(square_box(5.0, 2), GeneticConfig { seed: 7, ..config })
        .expect("ga")
        .run(&shifted_sphere);
    assert_ne!(first.population, other.population);
}

#[test]
fn elitism_never_loses_the_best_individual() {
    let ga = GeneticAlgorithm::new(square_box(5.0, 3), GeneticConfig::default()).expect("ga");
    let result = ga.run(&|genes: &[f64]| genes.iter().map(|g| g * g).sum::<f64>());

    for pair in result.history.windows(2) {
        assert!(
            pair[1].best <= pair[0].best,
            "generation {} regressed: {} > {}",
            pair[1].generation,
            pair[1].best,
            pair[0].best
        );
        assert!(pair[1].mean.is_finite());
    }
}

#[test]
fn population_stays_inside_the_bounds() {
    let bounds = Bounds::new(vec![(0.0, 1.0), (10.0, 10.5), (-3.0, -2.0)]).expect("bounds");
    let config = GeneticConfig {
        mutation_rate: 1.0,
        mutation_scale: 2.0,
        blend_alpha: 2.0,
        generations: 8,
        ..GeneticConfig::default()
    };
    let ga = GeneticAlgorithm::new(bounds.clone(), config).expect("ga");
    // Pull everything towards a corner outside the box.
    let result = ga.run(&|genes: &[f64]| genes.iter().map(|g| (g - 20.0).powi(2)).sum::<f64>());

    for individual in &result.population {
        assert!(
            bounds.contains(individual.genes()),
            "{:?} escaped",
            individual.genes()
        );
    }
}

#[test]
fn evaluations_skip_cached_individuals() {
    let config = GeneticConfig {
        generations: 5,
        ..GeneticConfig::default()
    };
    let ga = GeneticAlgorithm::new(square_box(5.0, 2), config).expect("ga");
    let result = ga.run(&shifted_sphere);

    assert_eq!(result.history[0].evaluations, config.population_size);
    for stats in &result.history[1..] {
        assert!(stats.evaluations <= config.population_size - config.elite_count);
    }
    let total: usize = result.history.iter().map(|stats| stats.evaluations).sum();
    assert_eq!(total, result.evaluations);
}

#[test]
fn non_finite_individuals_never_win() {
    let ga = GeneticAlgorithm::new(square_box(1.0, 1), GeneticConfig::default()).expect("ga");
    let result = ga.run(&|genes: &[f64]| if genes[0] > 0.0 { f64::NAN } else { -genes[0] });

    assert!(result.best.genes()[0] <= 0.0);
    assert!(result.best.score().is_finite());
}

#[test]
fn seeded_start_keeps_a_known_optimum() {
    let ga = GeneticAlgorithm::new(square_box(5.0, 2), GeneticConfig::default()).expect("ga");
    let result = ga
        .run_from(&shifted_sphere, vec![vec![1.0, -2.0], vec![9.0, 9.0]])
        .expect("seeded run");

    assert_eq!(result.history[0].best, 0.0);
    assert_eq!(result.best.genes(), &[1.0, -2.0]);
}

#[test]
fn seeds_of_the_wrong_length_are_rejected() {
    let ga = GeneticAlgorithm::new(square_box(5.0, 2), GeneticConfig::default()).expect("ga");
    assert_eq!(
        ga.run_from(&shifted_sphere, vec![vec![1.0, -2.0], vec![1.0]])
            .unwrap_err(),
        OptimizeError::DimensionMismatch {
            expected: 2,
            actual: 1
        }
    );
    assert!(matches!(
        ga.run_from(&shifted_sphere, vec![vec![0.0; 3]]),
        Err(OptimizeError::DimensionMismatch { expected: 2, actual: 3 })
    ));
}

#[test]
fn summaries_follow_the_best_individual() {
    let ga = GeneticAlgorithm::new(square_box(2.0, 1), GeneticConfig::default()).expect("ga");
    let result = ga.run(&Summarised);
    let summary = result.best.summary().expect("summary recorded");
    assert_eq!(summary.min_distance, result.best.fitness());
}

#[test]
fn gradient_config_is_validated() {
    let reject = |config: GradientConfig| GradientDescent::new(square_box(1.0, 1), config).is_err();
    assert!(reject(GradientConfig {
        learning_rate: 0.0,
        ..GradientConfig::default()
    }));
    assert!(reject(GradientConfig {
        finite_difference_step: -1e-6,
        ..GradientConfig::default()
    }));
    assert!(reject(GradientConfig {
        tolerance: f64::NAN,
        ..GradientConfig::default()
    }));
}

#[test]
fn gradient_descent_converges_on_a_quadratic() {
    let config = GradientConfig {
        learning_rate: 0.05,
        max_iterations: 500,
        ..GradientConfig::default()
    };
    let descent = GradientDescent::new(square_box(5.0, 2), config).expect("descent");
    let fitness = |genes: &[f64]| (genes[0] - 1.0).powi(2) + 10.0 * (genes[1] + 2.0).powi(2);
    let result = descent.run(&fitness, &[4.0, 4.0]).expect("run");

    assert!(result.converged);
    assert!((result.parameters[0] - 1.0).abs() < 1e-3, "{:?}", result.parameters);
    assert!((result.parameters[1] + 2.0).abs() < 1e-3, "{:?}", result.parameters);
    assert!(result.fitness < 1e-6);
    for pair in result.history.windows(2) {
        assert!(pair[1].fitness <= pair[0].fitness);
    }
    assert_eq!(result.iterations, result.history.len());
}

#[test]
fn gradient_descent_stops_on_the_boundary() {
    let bounds = Bounds::new(vec![(0.0, 3.0)]).expect("bounds");
    let descent = GradientDescent::new(bounds, GradientConfig::default()).expect("descent");
    let result = descent
        .run(&|genes: &[f64]| (genes[0] - 10.0).powi(2), &[-5.0])
        .expect("run");

    assert!(result.converged);
    assert_eq!(result.parameters, vec![3.0]);
    assert_eq!(result.fitness, 49.0);
}

#[test]
fn gradient_descent_rejects_wrong_dimension() {
    let descent =
        GradientDescent::new(square_box(1.0, 2), GradientConfig::default()).expect("descent");
    assert_eq!(
        descent.run(&shifted_sphere, &[0.0]),
        Err(OptimizeError::DimensionMismatch {
            expected: 2,
            actual: 1
        })
    );
}

#[test]
fn gradient_descent_carries_the_summary_of_the_final_point() {
    let descent =
        GradientDescent::new(square_box(2.0, 1), GradientConfig::default()).expect("descent");
    let result = descent.run(&Summarised, &[1.5]).expect("run");
    let summary = result.summary.expect("summary");
    assert_eq!(summary.min_distance, Some(result.fitness));
    assert!(result.fitness < 1.5);
}
