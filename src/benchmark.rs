//! Parameter-sweep experiments for the route optimizer.
//!
//! Runs named [`OptimizerConfig`] variants over several seeds (no geometry
//! enrichment), measures each extracted front with the 2-D hypervolume
//! indicator, aggregates per experiment and compares against the greedy
//! baseline.

use crate::baseline::{greedy_baseline, BaselineTour};
use crate::catalog::{CategoryId, LocationCatalog, LocationId};
use crate::config::OptimizerConfig;
use crate::error::OptimizeError;
use crate::individual::Fitness;
use crate::nsga::engine::Nsga2Engine;

use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// A named optimizer configuration.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub name: String,
    pub config: OptimizerConfig,
}

impl Experiment {
    pub fn new(name: &str, config: OptimizerConfig) -> Self {
        Experiment { name: name.to_string(), config }
    }
}

/// The standard sweep around `base`: crossover, mutation and population size.
pub fn default_experiments(base: &OptimizerConfig) -> Vec<Experiment> {
    vec![
        Experiment::new("Baseline", base.clone()),
        Experiment::new("High Crossover", OptimizerConfig { crossover_prob: 1.0, ..base.clone() }),
        Experiment::new("Low Crossover", OptimizerConfig { crossover_prob: 0.6, ..base.clone() }),
        Experiment::new("High Mutation", OptimizerConfig { mutation_prob: 0.5, ..base.clone() }),
        Experiment::new("Low Mutation", OptimizerConfig { mutation_prob: 0.05, ..base.clone() }),
        Experiment::new(
            "Larger Population",
            OptimizerConfig { population_size: base.population_size * 2, ..base.clone() },
        ),
    ]
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeds per experiment
    pub num_runs: usize,
    /// First seed; run `i` uses `base_seed + i`
    pub base_seed: u64,
    /// Run experiments in parallel
    pub parallel: bool,
    /// Categories the simulated user prefers
    pub preferred_categories: Vec<CategoryId>,
    /// Mandatory stops for every run
    pub required_stops: Vec<LocationId>,
    /// Start of the greedy baseline tour
    pub baseline_start: LocationId,
    /// Hypervolume reference point (distance, satisfaction); derived from all fronts when unset
    pub reference_point: Option<(f64, f64)>,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            base_seed: 0,
            parallel: true,
            preferred_categories: vec![1],
            required_stops: Vec::new(),
            baseline_start: 17,
            reference_point: None,
            show_progress: true,
        }
    }
}

/// Outcome of one (experiment, seed) run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub experiment: String,
    pub seed: u64,
    /// Wall-clock seconds
    pub time: f64,
    pub generations: usize,
    pub evaluations: usize,
    pub front_size: usize,
    pub best_distance: f64,
    pub best_satisfaction: f64,
    pub hypervolume: f64,
    /// Some finalist dominates the greedy baseline tour
    pub beats_baseline: bool,
}

/// Aggregated statistics for an experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentStatistics {
    pub experiment: String,
    pub runs: usize,
    pub mean_hypervolume: f64,
    pub std_hypervolume: f64,
    pub best_hypervolume: f64,
    pub mean_time: f64,
    pub std_time: f64,
    pub mean_front_size: f64,
    /// Fraction of runs whose finalists dominate the baseline
    pub baseline_win_rate: f64,
}

/// 2-D hypervolume of `points` (distance minimized, satisfaction maximized)
/// with respect to `reference = (distance, satisfaction)`.
///
/// Points not strictly better than the reference on both objectives
/// contribute nothing.
pub fn hypervolume(points: &[Fitness], reference: (f64, f64)) -> f64 {
    let (ref_distance, ref_satisfaction) = reference;
    let mut inside: Vec<&Fitness> = points
        .iter()
        .filter(|p| p.distance < ref_distance && p.satisfaction > ref_satisfaction)
        .collect();
    inside.sort_by_key(|p| OrderedFloat(p.distance));

    let mut volume = 0.0;
    let mut best_satisfaction = ref_satisfaction;
    for (i, p) in inside.iter().enumerate() {
        best_satisfaction = best_satisfaction.max(p.satisfaction);
        let next_distance = inside.get(i + 1).map_or(ref_distance, |q| q.distance);
        volume += (next_distance - p.distance) * (best_satisfaction - ref_satisfaction);
    }
    volume
}

/// Reference point just outside every front: worst finite distance and
/// lowest satisfaction seen, pushed out by 10% of the range.
fn derive_reference(fronts: &[Vec<Fitness>]) -> (f64, f64) {
    let points = fronts.iter().flatten().filter(|f| f.distance.is_finite());
    let (mut max_d, mut min_d) = (f64::NEG_INFINITY, f64::INFINITY);
    let (mut max_s, mut min_s) = (f64::NEG_INFINITY, f64::INFINITY);
    for p in points {
        max_d = max_d.max(p.distance);
        min_d = min_d.min(p.distance);
        max_s = max_s.max(p.satisfaction);
        min_s = min_s.min(p.satisfaction);
    }
    if !max_d.is_finite() {
        return (1.0, 0.0);
    }
    let pad_d = ((max_d - min_d) * 0.1).max(1e-6);
    let pad_s = ((max_s - min_s) * 0.1).max(1e-6);
    (max_d + pad_d, min_s - pad_s)
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
    fronts: Vec<Vec<Fitness>>,
    baseline: Option<BaselineTour>,
    reference: (f64, f64),
    started: DateTime<Local>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            fronts: Vec::new(),
            baseline: None,
            reference: (1.0, 0.0),
            started: Local::now(),
        }
    }

    /// Run every experiment `num_runs` times on `catalog`.
    pub fn run(&mut self, catalog: &LocationCatalog, experiments: &[Experiment]) -> Result<(), OptimizeError> {
        self.started = Local::now();
        log::info!("Running {} experiments x {} seeds", experiments.len(), self.config.num_runs);

        let min_locations = experiments.first().map_or(5, |e| e.config.min_locations);
        self.baseline = greedy_baseline(
            catalog,
            self.config.baseline_start,
            &self.config.preferred_categories,
            min_locations,
        );
        if self.baseline.is_none() {
            log::warn!("Baseline start {} not in catalog; skipping baseline", self.config.baseline_start);
        }

        let jobs: Vec<(&Experiment, u64)> = experiments
            .iter()
            .flat_map(|e| (0..self.config.num_runs).map(move |i| (e, i as u64)))
            .map(|(e, i)| (e, self.config.base_seed + i))
            .collect();

        let progress = if self.config.show_progress {
            let pb = ProgressBar::new(jobs.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} runs {msg}") {
                pb.set_style(style.progress_chars("##-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let run_one = |&(experiment, seed): &(&Experiment, u64)| {
            let outcome = self.run_single(catalog, experiment, seed);
            progress.inc(1);
            outcome
        };
        let outcomes: Vec<Result<(RunResult, Vec<Fitness>), OptimizeError>> = if self.config.parallel {
            jobs.par_iter().map(run_one).collect()
        } else {
            jobs.iter().map(run_one).collect()
        };
        progress.finish_with_message("done");

        let mut results = Vec::with_capacity(outcomes.len());
        let mut fronts = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let (result, front) = outcome?;
            results.push(result);
            fronts.push(front);
        }

        self.reference = self.config.reference_point.unwrap_or_else(|| derive_reference(&fronts));
        for (result, front) in results.iter_mut().zip(&fronts) {
            result.hypervolume = hypervolume(front, self.reference);
        }

        self.results = results;
        self.fronts = fronts;
        Ok(())
    }

    fn run_single(
        &self,
        catalog: &LocationCatalog,
        experiment: &Experiment,
        seed: u64,
    ) -> Result<(RunResult, Vec<Fitness>), OptimizeError> {
        let config = OptimizerConfig { seed, ..experiment.config.clone() };
        let start = Instant::now();

        let mut engine = Nsga2Engine::new(
            catalog,
            &self.config.preferred_categories,
            &self.config.required_stops,
            config,
        )?;
        engine.run();
        let front: Vec<Fitness> = engine.pareto_front().iter().map(|i| i.fitness_or_worst()).collect();
        let time = start.elapsed().as_secs_f64();

        let beats_baseline = self.baseline
            .as_ref()
            .map_or(false, |b| front.iter().any(|f| f.dominates(&b.fitness)));

        log::debug!("{} seed {}: {} finalists in {:.3}s", experiment.name, seed, front.len(), time);

        let result = RunResult {
            experiment: experiment.name.clone(),
            seed,
            time,
            generations: engine.current_generation(),
            evaluations: engine.evaluations(),
            front_size: front.len(),
            best_distance: front.iter().map(|f| f.distance).fold(f64::INFINITY, f64::min),
            best_satisfaction: front.iter().map(|f| f.satisfaction).fold(f64::NEG_INFINITY, f64::max),
            hypervolume: 0.0,
            beats_baseline,
        };
        Ok((result, front))
    }

    /// Compute statistics for each experiment, in first-seen order.
    pub fn compute_statistics(&self) -> Vec<ExperimentStatistics> {
        let mut names: Vec<&str> = Vec::new();
        for r in &self.results {
            if !names.contains(&r.experiment.as_str()) {
                names.push(&r.experiment);
            }
        }

        names
            .into_iter()
            .map(|name| {
                let runs: Vec<&RunResult> = self.results.iter().filter(|r| r.experiment == name).collect();
                let hv: Vec<f64> = runs.iter().map(|r| r.hypervolume).collect();
                let times: Vec<f64> = runs.iter().map(|r| r.time).collect();
                let spread = |v: &[f64]| if v.len() > 1 { v.std_dev() } else { 0.0 };

                ExperimentStatistics {
                    experiment: name.to_string(),
                    runs: runs.len(),
                    mean_hypervolume: hv.iter().mean(),
                    std_hypervolume: spread(&hv),
                    best_hypervolume: hv.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                    mean_time: times.iter().mean(),
                    std_time: spread(&times),
                    mean_front_size: runs.iter().map(|r| r.front_size as f64).mean(),
                    baseline_win_rate: runs.iter().filter(|r| r.beats_baseline).count() as f64 / runs.len() as f64,
                }
            })
            .collect()
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Route Optimizer Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Started: {}\n", self.started.format("%Y-%m-%d %H:%M:%S")));
        report.push_str(&format!(
            "Hypervolume reference: distance {:.5}, satisfaction {:.4}\n\n",
            self.reference.0, self.reference.1
        ));

        report.push_str("Experiment Summary:\n");
        report.push_str("-".repeat(88).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<20} {:>5} {:>12} {:>10} {:>12} {:>10} {:>8} {:>6}\n",
            "Experiment", "Runs", "Mean HV", "Std HV", "Best HV", "Time (s)", "Front", "Wins"
        ));
        report.push_str("-".repeat(88).as_str());
        report.push('\n');

        let stats = self.compute_statistics();
        for stat in &stats {
            report.push_str(&format!(
                "{:<20} {:>5} {:>12.6} {:>10.6} {:>12.6} {:>10.4} {:>8.2} {:>5.0}%\n",
                stat.experiment,
                stat.runs,
                stat.mean_hypervolume,
                stat.std_hypervolume,
                stat.best_hypervolume,
                stat.mean_time,
                stat.mean_front_size,
                stat.baseline_win_rate * 100.0
            ));
        }
        report.push_str("-".repeat(88).as_str());
        report.push('\n');

        if let Some(best) = stats.iter().max_by_key(|s| OrderedFloat(s.mean_hypervolume)) {
            report.push_str(&format!("\nBest configuration: {} (mean HV {:.6})\n", best.experiment, best.mean_hypervolume));
        }
        match &self.baseline {
            Some(b) => report.push_str(&format!("Baseline: {}\n", b)),
            None => report.push_str("Baseline: unavailable\n"),
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    /// Finalist objective values, one entry per run in result order.
    pub fn fronts(&self) -> &[Vec<Fitness>] {
        &self.fronts
    }

    pub fn baseline(&self) -> Option<&BaselineTour> {
        self.baseline.as_ref()
    }

    pub fn reference_point(&self) -> (f64, f64) {
        self.reference
    }

    /// Timestamp suitable for output file names.
    pub fn timestamp(&self) -> String {
        self.started.format("%Y%m%d_%H%M%S").to_string()
    }
}
