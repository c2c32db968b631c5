//! NSGA-II evolutionary loop.
//!
//! INIT creates and evaluates `population_size` individuals. Each EVOLVE step
//! runs binary tournament selection on (rank, crowding distance), pairwise
//! crossover, mutation, constraint repair after every operator, evaluation of
//! invalidated offspring, and elitist truncation of parents ∪ offspring.
//! The loop stops after `generations` steps, or earlier when the optional
//! deadline has passed (checked between generations only).

use crate::catalog::{CategoryId, LocationCatalog, LocationId};
use crate::config::OptimizerConfig;
use crate::error::{OptimizeError, ValidationError};
use crate::individual::{Fitness, Individual};
use crate::nsga::constraints::{enforce, RequiredStops};
use crate::nsga::factory::ChromosomeFactory;
use crate::nsga::fitness::FitnessEvaluator;
use crate::nsga::operators::{mate, mutate, OperatorParams};
use crate::nsga::pareto;
use crate::nsga::sorting::{select_best, Ranking};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// One optimization run over a catalog snapshot.
pub struct Nsga2Engine<'a> {
    config: OptimizerConfig,
    params: OperatorParams,
    all_ids: Vec<LocationId>,
    required: RequiredStops,
    evaluator: FitnessEvaluator<'a>,
    population: Vec<Individual>,
    rng: ChaCha8Rng,
    generation: usize,
    deadline: Option<Instant>,
    deadline_hit: bool,
}

impl<'a> Nsga2Engine<'a> {
    /// Check the request and set up the run. Nothing is evaluated here, so a
    /// rejected request costs no fitness evaluations.
    pub fn new(
        catalog: &'a LocationCatalog,
        preferred_categories: &[CategoryId],
        required_stops: &[LocationId],
        config: OptimizerConfig,
    ) -> Result<Self, OptimizeError> {
        config.validate()?;

        if let Some(&missing) = required_stops.iter().find(|&&id| !catalog.contains(id)) {
            log::info!("Rejecting request: required stop {} not in catalog", missing);
            return Err(ValidationError::UnknownRequiredStop(missing).into());
        }

        let deadline = config.time_limit
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .and_then(|budget| Instant::now().checked_add(budget));

        Ok(Nsga2Engine {
            params: OperatorParams::from(&config),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            all_ids: catalog.ids(),
            required: RequiredStops::new(required_stops.to_vec()),
            evaluator: FitnessEvaluator::new(catalog, preferred_categories),
            population: Vec::new(),
            generation: 0,
            deadline,
            deadline_hit: false,
            config,
        })
    }

    /// Replace the deadline derived from `time_limit`.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Create and evaluate the initial population.
    fn initialize_population(&mut self) {
        let factory = ChromosomeFactory::new(&self.all_ids, &self.required, &self.config);
        self.population = (0..self.config.population_size)
            .map(|_| factory.create(&mut self.rng))
            .collect();
        evaluate_invalid(&self.evaluator, &mut self.population, self.config.parallel);
        self.generation = 0;
    }

    /// Binary tournament on the crowded comparison; ties are broken at random.
    fn tournament_select(&mut self, ranking: &Ranking) -> usize {
        let n = self.population.len();
        let a = self.rng.gen_range(0..n);
        let b = self.rng.gen_range(0..n);
        match ranking.crowded_cmp(a, b) {
            Ordering::Less => a,
            Ordering::Greater => b,
            Ordering::Equal => {
                if self.rng.gen_bool(0.5) { a } else { b }
            }
        }
    }

    /// One generation.
    fn evolve(&mut self) {
        let fitness: Vec<Fitness> = self.population.iter().map(Individual::fitness_or_worst).collect();
        let ranking = Ranking::new(&fitness);

        let mut offspring: Vec<Individual> = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let winner = self.tournament_select(&ranking);
            offspring.push(self.population[winner].clone());
        }

        for pair in offspring.chunks_exact_mut(2) {
            if self.rng.gen::<f64>() < self.config.crossover_prob {
                let (left, right) = pair.split_at_mut(1);
                mate(&mut left[0], &mut right[0], &self.params, &mut self.rng);
                enforce(&mut left[0], &self.required, self.params.max_locations);
                enforce(&mut right[0], &self.required, self.params.max_locations);
            }
        }

        for child in offspring.iter_mut() {
            if self.rng.gen::<f64>() < self.config.mutation_prob {
                mutate(child, &self.all_ids, &self.required, &self.params, &mut self.rng);
                enforce(child, &self.required, self.params.max_locations);
            }
        }

        evaluate_invalid(&self.evaluator, &mut offspring, self.config.parallel);

        let mut combined = std::mem::take(&mut self.population);
        combined.extend(offspring);
        let combined_fitness: Vec<Fitness> = combined.iter().map(Individual::fitness_or_worst).collect();
        let survivors = select_best(&combined_fitness, self.config.population_size);

        let mut slots: Vec<Option<Individual>> = combined.into_iter().map(Some).collect();
        self.population = survivors.into_iter().filter_map(|i| slots[i].take()).collect();
        self.generation += 1;
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Run INIT and the EVOLVE loop; returns the final population.
    pub fn run(&mut self) -> &[Individual] {
        let start = Instant::now();
        self.initialize_population();

        while self.generation < self.config.generations {
            if self.deadline_passed() {
                self.deadline_hit = true;
                log::warn!(
                    "Deadline reached after {} of {} generations",
                    self.generation, self.config.generations
                );
                break;
            }

            self.evolve();

            if log::log_enabled!(log::Level::Debug) {
                let (front_size, best_distance, best_satisfaction) = self.front_summary();
                log::debug!(
                    "[NSGA-II] Gen {}  Front {}  Best distance {:.5}  Best satisfaction {:.4}",
                    self.generation, front_size, best_distance, best_satisfaction
                );
            }
        }

        if !self.deadline_hit && self.deadline_passed() {
            self.deadline_hit = true;
        }

        log::info!(
            "NSGA-II finished: {} generations, {} evaluations, {:.2}s",
            self.generation,
            self.evaluator.evaluations(),
            start.elapsed().as_secs_f64()
        );

        &self.population
    }

    /// Size of front 0, lowest distance and highest satisfaction in the population.
    fn front_summary(&self) -> (usize, f64, f64) {
        let fitness: Vec<Fitness> = self.population.iter().map(Individual::fitness_or_worst).collect();
        let ranking = Ranking::new(&fitness);
        let front_size = ranking.rank.iter().filter(|&&r| r == 0).count();
        let best_distance = fitness.iter().map(|f| f.distance).fold(f64::INFINITY, f64::min);
        let best_satisfaction = fitness.iter().map(|f| f.satisfaction).fold(f64::NEG_INFINITY, f64::max);
        (front_size, best_distance, best_satisfaction)
    }

    /// Finalists of the current population.
    pub fn pareto_front(&self) -> Vec<Individual> {
        pareto::extract(&self.population, self.config.result_count)
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Generations completed.
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    pub fn evaluations(&self) -> usize {
        self.evaluator.evaluations()
    }

    /// True if the run stopped on, or finished past, its deadline.
    pub fn deadline_hit(&self) -> bool {
        self.deadline_hit
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }
}

/// Evaluate every individual without a fitness, in parallel if requested.
fn evaluate_invalid(evaluator: &FitnessEvaluator<'_>, individuals: &mut [Individual], parallel: bool) {
    if parallel {
        individuals.par_iter_mut().for_each(|ind| {
            evaluator.ensure_evaluated(ind);
        });
    } else {
        for ind in individuals.iter_mut() {
            evaluator.ensure_evaluated(ind);
        }
    }
}
