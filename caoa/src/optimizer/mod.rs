pub mod bounds;
pub mod policy;
pub mod population;

use std::time::Instant;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

pub use bounds::Bounds;
pub use policy::{AcceptancePolicy, Leader, LeaderPolicy, Perturbation, Verdict};
pub use population::{Candidate, GlobalBest, Population};

use crate::{error::OptimizeError, objective::Objective};
use population::{step_candidate, StepOutcome};

#[derive(Debug, Clone)]
pub struct CaoaOptions {
    pub population_size: usize,
    pub number_of_iterations: usize,
    /// Share of the distance to the leader covered by one move.
    pub alpha: f64,
    /// Amplitude of the random term of a move.
    pub beta: f64,
    /// Energy spent per unit of distance moved.
    pub gamma: f64,
    /// Smallest fitness change the acceptance policy reacts to.
    pub delta: f64,
    pub initial_energy: f64,
    pub leader_policy: LeaderPolicy,
    pub acceptance_policy: AcceptancePolicy,
    pub perturbation: Perturbation,
    pub parallel: bool,
    /// Log progress every that many iterations, 0 turns reporting off.
    pub report_interval: usize,
    /// Drawn from the thread rng and logged when absent.
    pub seed: Option<u64>,
}

impl Default for CaoaOptions {
    fn default() -> Self {
        Self {
            population_size: 50,
            number_of_iterations: 100,
            alpha: 0.5,
            beta: 0.1,
            gamma: 0.8,
            delta: 1e-4,
            initial_energy: 100.0,
            leader_policy: LeaderPolicy::default(),
            acceptance_policy: AcceptancePolicy::default(),
            perturbation: Perturbation::default(),
            parallel: false,
            report_interval: 10,
            seed: None,
        }
    }
}

impl CaoaOptions {
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.population_size == 0 {
            return Err(OptimizeError::InvalidOptions(
                "population size must be at least 1".to_string(),
            ));
        }
        if self.number_of_iterations == 0 {
            return Err(OptimizeError::InvalidOptions(
                "number of iterations must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("delta", self.delta),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(OptimizeError::InvalidOptions(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        if !self.initial_energy.is_finite() || self.initial_energy <= 0.0 {
            return Err(OptimizeError::InvalidOptions(format!(
                "initial energy must be positive, got {}",
                self.initial_energy
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaoaOutcome {
    pub best_position: Vec<f64>,
    pub best_fitness: f64,
    /// Best fitness after every iteration.
    pub convergence: Vec<f64>,
    pub evaluations: usize,
    pub respawns: usize,
    pub seed: u64,
}

struct RunState<'a, O: ?Sized> {
    objective: &'a O,
    bounds: &'a Bounds,
    options: &'a CaoaOptions,
    population: Population,
    best: GlobalBest,
    rng: ChaCha8Rng,
    convergence: Vec<f64>,
    evaluations: usize,
    respawns: usize,
}

impl<'a, O: Objective + ?Sized> RunState<'a, O> {
    fn new(
        objective: &'a O,
        bounds: &'a Bounds,
        options: &'a CaoaOptions,
        seed: u64,
    ) -> Result<Self, OptimizeError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let population = Population::initialize(
            objective,
            bounds,
            options.population_size,
            options.initial_energy,
            options.parallel,
            &mut rng,
        )?;

        let best = match population.best() {
            Some((_, candidate)) => GlobalBest {
                position: candidate.position.clone(),
                fitness: candidate.fitness,
            },
            None => {
                return Err(OptimizeError::InvalidOptions(
                    "population size must be at least 1".to_string(),
                ))
            }
        };

        Ok(Self {
            objective,
            bounds,
            options,
            evaluations: population.len(),
            population,
            best,
            rng,
            convergence: Vec::with_capacity(options.number_of_iterations),
            respawns: 0,
        })
    }

    /// Runs one iteration and returns how many candidates were respawned.
    fn iterate(&mut self) -> Result<usize, OptimizeError> {
        let leader = self
            .options
            .leader_policy
            .select(&self.population, &self.best);

        let seeds: Vec<u64> = (0..self.population.len())
            .map(|_| self.rng.gen())
            .collect();

        let (objective, bounds, options) = (self.objective, self.bounds, self.options);
        let step = |(index, (candidate, seed)): (usize, (&mut Candidate, u64))| {
            if leader.candidate == Some(index) {
                return Ok(None);
            }

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            step_candidate(candidate, &leader, objective, bounds, options, &mut rng).map(Some)
        };

        let outcomes: Vec<Option<StepOutcome>> = if options.parallel {
            self.population
                .candidates
                .par_iter_mut()
                .zip(seeds.into_par_iter())
                .enumerate()
                .map(step)
                .collect::<Result<_, _>>()?
        } else {
            self.population
                .candidates
                .iter_mut()
                .zip(seeds)
                .enumerate()
                .map(step)
                .collect::<Result<_, _>>()?
        };

        let mut depleted = 0;
        for outcome in outcomes.into_iter().flatten() {
            self.evaluations += outcome.evaluations;

            if let Some((position, fitness)) = outcome.pre_respawn {
                depleted += 1;
                self.best.offer(&position, fitness);
            }
        }

        for candidate in &self.population.candidates {
            self.best.offer(&candidate.position, candidate.fitness);
        }

        self.respawns += depleted;
        self.convergence.push(self.best.fitness);

        Ok(depleted)
    }
}

/// Minimizes `objective` inside `bounds` with the crocodile ambush optimizer.
pub fn optimize<O: Objective + ?Sized>(
    objective: &O,
    bounds: &Bounds,
    options: &CaoaOptions,
) -> Result<CaoaOutcome, OptimizeError> {
    options.validate()?;

    if bounds.dimension() != objective.dimension() {
        return Err(OptimizeError::InvalidOptions(format!(
            "bounds have {} dimensions, objective expects {}",
            bounds.dimension(),
            objective.dimension()
        )));
    }

    let seed = options.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(
        "optimizing {} dimensions with {} candidates for {} iterations (seed {seed})",
        objective.dimension(),
        options.population_size,
        options.number_of_iterations
    );

    let start_time = Instant::now();
    let mut state = RunState::new(objective, bounds, options, seed)?;
    info!("initial best fitness: {}", state.best.fitness);

    for iteration in 1..=options.number_of_iterations {
        let depleted = state.iterate()?;

        debug!(
            "iteration {iteration}: best {} - depleted {depleted} - evaluations {}",
            state.best.fitness, state.evaluations
        );

        let report_interval = options.report_interval;
        if report_interval > 0 && (iteration == 1 || iteration % report_interval == 0) {
            info!(
                "iter {iteration:>4}/{} | {:>7.2}s | depleted {depleted:>3}/{} | best {:.4} | mean {:.4}",
                options.number_of_iterations,
                start_time.elapsed().as_secs_f64(),
                state.population.len(),
                state.best.fitness,
                state.population.mean_fitness()
            );
        }
    }

    info!(
        "best fitness {} after {} evaluations and {} respawns",
        state.best.fitness, state.evaluations, state.respawns
    );

    Ok(CaoaOutcome {
        best_position: state.best.position,
        best_fitness: state.best.fitness,
        convergence: state.convergence,
        evaluations: state.evaluations,
        respawns: state.respawns,
        seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{EvaluationError, OptimizeError},
        evaluator::{DecodingStrategy, DelayMeasure, ScheduleEvaluator, DEFAULT_MAX_SHIFT},
        model::{Capacity, Problem, Visit},
        objective::{Benchmark, BenchmarkFunction},
    };

    fn busy_port() -> Problem {
        Problem::new(
            vec![
                Visit::new(1, "A", "P1", 0.0, 6.0, 2.0),
                Visit::new(2, "B", "P1", 1.0, 4.0, 3.0),
                Visit::new(3, "C", "P1", 2.0, 5.0, 4.0),
                Visit::new(4, "A", "P2", 10.0, 3.0, 12.0),
                Visit::new(5, "D", "P2", 9.0, 6.0, 10.0),
                Visit::new(6, "E", "P1", 3.0, 2.0, 5.0),
            ],
            vec![Capacity::new(1, "P1", 1), Capacity::new(2, "P2", 1)],
        )
        .unwrap()
    }

    fn small_options(seed: u64) -> CaoaOptions {
        CaoaOptions {
            population_size: 12,
            number_of_iterations: 25,
            report_interval: 0,
            seed: Some(seed),
            ..CaoaOptions::default()
        }
    }

    #[test]
    fn sphere_improves_on_initial_population() {
        let objective = Benchmark::new(BenchmarkFunction::Sphere, 5);
        let bounds = Bounds::uniform(5, -100.0, 100.0).unwrap();
        let options = CaoaOptions {
            population_size: 20,
            number_of_iterations: 100,
            seed: Some(11),
            ..CaoaOptions::default()
        };

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let initial =
            Population::initialize(&objective, &bounds, 20, 100.0, false, &mut rng).unwrap();
        let initial_best = initial.best().map(|(_, c)| c.fitness).unwrap();

        let outcome = optimize(&objective, &bounds, &options).unwrap();

        assert!(outcome.best_fitness < initial_best);
        assert_eq!(outcome.best_fitness, objective.evaluate(&outcome.best_position).unwrap());
        assert_eq!(outcome.convergence.len(), 100);
        assert_eq!(outcome.seed, 11);
    }

    #[test]
    fn convergence_never_increases() {
        let problem = busy_port();
        let evaluator = ScheduleEvaluator::port(&problem);
        let bounds = Bounds::uniform(problem.len(), 0.0, 1.0).unwrap();

        for leader_policy in [LeaderPolicy::GlobalBest, LeaderPolicy::FitnessProximity] {
            for acceptance_policy in [AcceptancePolicy::Greedy, AcceptancePolicy::Exploratory] {
                for perturbation in [Perturbation::Scalar, Perturbation::PerDimension] {
                    let options = CaoaOptions {
                        leader_policy,
                        acceptance_policy,
                        perturbation,
                        ..small_options(5)
                    };

                    let outcome = optimize(&evaluator, &bounds, &options).unwrap();

                    assert_eq!(outcome.convergence.len(), options.number_of_iterations);
                    assert!(
                        outcome.convergence.windows(2).all(|pair| pair[1] <= pair[0]),
                        "{options:?}: {:?}",
                        outcome.convergence
                    );
                    assert_eq!(outcome.convergence.last(), Some(&outcome.best_fitness));
                    assert_eq!(
                        evaluator.evaluate(&outcome.best_position).unwrap(),
                        outcome.best_fitness
                    );
                    assert!(outcome
                        .best_position
                        .iter()
                        .all(|p| (0.0..=1.0).contains(p)));
                }
            }
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let problem = busy_port();
        let evaluator = ScheduleEvaluator::new(
            &problem,
            DecodingStrategy::TimeShift {
                max_shift: DEFAULT_MAX_SHIFT,
            },
            DelayMeasure::Completion,
        );
        let bounds = Bounds::uniform(problem.len(), 0.0, 1.0).unwrap();

        for acceptance_policy in [AcceptancePolicy::Greedy, AcceptancePolicy::Exploratory] {
            let sequential = CaoaOptions {
                acceptance_policy,
                ..small_options(17)
            };
            let parallel = CaoaOptions {
                parallel: true,
                ..sequential.clone()
            };

            assert_eq!(
                optimize(&evaluator, &bounds, &sequential).unwrap(),
                optimize(&evaluator, &bounds, &parallel).unwrap()
            );
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let objective = Benchmark::new(BenchmarkFunction::Rastrigin, 3);
        let bounds = Bounds::uniform(3, -5.12, 5.12).unwrap();

        let first = optimize(&objective, &bounds, &small_options(23)).unwrap();
        let second = optimize(&objective, &bounds, &small_options(23)).unwrap();
        let other = optimize(&objective, &bounds, &small_options(24)).unwrap();

        assert_eq!(first, second);
        assert_ne!(first.convergence, other.convergence);
    }

    #[test]
    fn depleted_candidates_respawn_fresh() {
        let objective = Benchmark::new(BenchmarkFunction::Sphere, 3);
        let bounds = Bounds::uniform(3, -50.0, 50.0).unwrap();
        let options = CaoaOptions {
            population_size: 8,
            gamma: 1e9,
            initial_energy: 1.0,
            acceptance_policy: AcceptancePolicy::Exploratory,
            ..small_options(31)
        };

        let mut state = RunState::new(&objective, &bounds, &options, 31).unwrap();
        let depleted = state.iterate().unwrap();

        assert_eq!(depleted, 8);
        assert_eq!(state.respawns, 8);
        for candidate in &state.population.candidates {
            assert_eq!(candidate.energy, 1.0);
            assert_eq!(candidate.fitness, objective.evaluate(&candidate.position).unwrap());
        }
    }

    #[test]
    fn leader_candidate_stays_put() {
        let objective = Benchmark::new(BenchmarkFunction::Sphere, 2);
        let bounds = Bounds::uniform(2, -10.0, 10.0).unwrap();
        let options = CaoaOptions {
            leader_policy: LeaderPolicy::FitnessProximity,
            ..small_options(2)
        };

        let mut state = RunState::new(&objective, &bounds, &options, 2).unwrap();
        let (leader, before) = state
            .population
            .best()
            .map(|(index, candidate)| (index, candidate.clone()))
            .unwrap();

        let evaluations = state.evaluations;
        state.iterate().unwrap();

        assert_eq!(state.population.candidates[leader], before);
        assert!(state.evaluations >= evaluations + options.population_size - 1);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let objective = Benchmark::new(BenchmarkFunction::Sphere, 2);
        let bounds = Bounds::uniform(2, -1.0, 1.0).unwrap();

        for options in [
            CaoaOptions {
                population_size: 0,
                ..CaoaOptions::default()
            },
            CaoaOptions {
                number_of_iterations: 0,
                ..CaoaOptions::default()
            },
            CaoaOptions {
                alpha: -0.5,
                ..CaoaOptions::default()
            },
            CaoaOptions {
                delta: f64::NAN,
                ..CaoaOptions::default()
            },
            CaoaOptions {
                initial_energy: 0.0,
                ..CaoaOptions::default()
            },
        ] {
            assert!(matches!(
                optimize(&objective, &bounds, &options),
                Err(OptimizeError::InvalidOptions(_))
            ));
        }

        let wrong_bounds = Bounds::uniform(3, -1.0, 1.0).unwrap();
        assert!(matches!(
            optimize(&objective, &wrong_bounds, &small_options(1)),
            Err(OptimizeError::InvalidOptions(_))
        ));
    }

    struct Exploding;

    impl Objective for Exploding {
        fn dimension(&self) -> usize {
            1
        }

        fn evaluate(&self, position: &[f64]) -> Result<f64, EvaluationError> {
            Ok(position[0] / 0.0)
        }
    }

    #[test]
    fn evaluation_errors_propagate() {
        let bounds = Bounds::uniform(1, -1.0, 1.0).unwrap();

        assert!(matches!(
            optimize(&Exploding, &bounds, &small_options(1)),
            Err(OptimizeError::Evaluation(EvaluationError::NonFiniteFitness(_)))
        ));
    }
}
