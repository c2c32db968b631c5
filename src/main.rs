//! POI Route Optimizer - Command Line Interface
//!
//! Multi-objective route search over a catalog of points of interest.

use clap::{Parser, Subcommand, ValueEnum};
use poi_route_optimizer::benchmark::{default_experiments, Benchmark, BenchmarkConfig};
use poi_route_optimizer::catalog::{category_name, CategoryId, LocationCatalog, LocationId};
use poi_route_optimizer::config::{OptimizerConfig, RoutingConfig};
use poi_route_optimizer::baseline::greedy_baseline;
use poi_route_optimizer::individual::Fitness;
use poi_route_optimizer::optimizer::{list_locations, RouteOptimizer};
use poi_route_optimizer::routing::{ModeRouter, TravelMode};
use poi_route_optimizer::visualization::Visualizer;

use std::path::{Path, PathBuf};
use std::process::exit;

#[derive(Parser)]
#[command(name = "poi-route-optimizer")]
#[command(version = "1.0")]
#[command(about = "NSGA-II route optimizer trading travel distance against satisfaction")]
struct Cli {
    /// Location catalog (.csv or .json); the bundled London sample when omitted
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog locations
    Locations {
        /// Only these category ids (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        category: Vec<CategoryId>,
    },

    /// Search for non-dominated routes
    Optimize {
        /// Preferred category ids (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        preferred: Vec<CategoryId>,

        /// Location ids every route must visit (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        required: Vec<LocationId>,

        #[arg(short, long, value_enum, default_value = "walking")]
        mode: Mode,

        /// JSON optimizer configuration; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        population: Option<usize>,

        #[arg(long)]
        generations: Option<usize>,

        #[arg(long)]
        results: Option<usize>,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Time limit in seconds
        #[arg(short, long)]
        time_limit: Option<f64>,

        /// Write the routes as JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write an SVG map of the routes
        #[arg(long)]
        visualize: Option<PathBuf>,

        /// Print the run report
        #[arg(long)]
        report: bool,
    },

    /// Fetch geometry for a fixed ordering of stops
    Recalculate {
        /// Ordered location ids (comma separated)
        #[arg(value_delimiter = ',', required = true)]
        ids: Vec<LocationId>,

        #[arg(short, long, value_enum, default_value = "walking")]
        mode: Mode,
    },

    /// Run the parameter sweep
    Benchmark {
        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of seeds per experiment
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Preferred category ids (comma separated)
        #[arg(short, long, value_delimiter = ',', default_value = "1")]
        preferred: Vec<CategoryId>,

        /// Start of the greedy baseline tour
        #[arg(long, default_value = "17")]
        baseline_start: LocationId,

        /// Base JSON optimizer configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also render the fronts as SVG (and PNG when possible)
        #[arg(long)]
        visualize: bool,
    },

    /// Print catalog statistics
    Analyze,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Mode {
    Walking,
    Cycling,
    Driving,
    Transit,
}

impl From<Mode> for TravelMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Walking => TravelMode::Walking,
            Mode::Cycling => TravelMode::Cycling,
            Mode::Driving => TravelMode::Driving,
            Mode::Transit => TravelMode::Transit,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let catalog = load_catalog(cli.catalog.as_deref());

    match cli.command {
        Commands::Locations { category } => {
            show_locations(&catalog, &category);
        }

        Commands::Optimize {
            preferred, required, mode, config, population, generations, results, seed, time_limit, output, visualize, report,
        } => {
            let mut cfg = load_config(config.as_deref());
            if let Some(p) = population { cfg.population_size = p; }
            if let Some(g) = generations { cfg.generations = g; }
            if let Some(k) = results { cfg.result_count = k; }
            if let Some(s) = seed { cfg.seed = s; }
            if time_limit.is_some() { cfg.time_limit = time_limit; }
            optimize(&catalog, cfg, &preferred, &required, mode.into(), output, visualize, report);
        }

        Commands::Recalculate { ids, mode } => {
            recalculate(&catalog, &ids, mode.into());
        }

        Commands::Benchmark { output, runs, preferred, baseline_start, config, visualize } => {
            let base = load_config(config.as_deref());
            run_benchmark(&catalog, base, &output, runs, preferred, baseline_start, visualize);
        }

        Commands::Analyze => {
            analyze_catalog(&catalog);
        }
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    exit(1);
}

fn load_catalog(path: Option<&Path>) -> LocationCatalog {
    match path {
        Some(p) => LocationCatalog::from_file(p).unwrap_or_else(|e| fail(format!("loading {:?}: {}", p, e))),
        None => LocationCatalog::sample(),
    }
}

fn load_config(path: Option<&Path>) -> OptimizerConfig {
    match path {
        Some(p) => OptimizerConfig::from_file(p).unwrap_or_else(|e| fail(e)),
        None => OptimizerConfig::default(),
    }
}

fn router() -> ModeRouter {
    ModeRouter::from_config(&RoutingConfig::from_env())
}

fn show_locations(catalog: &LocationCatalog, categories: &[CategoryId]) {
    let filter = if categories.is_empty() { None } else { Some(categories) };
    let locations = list_locations(catalog, filter);

    println!("{:>4}  {:<32} {:>9} {:>9}  {:<15} {:>9}", "id", "name", "lat", "lon", "category", "sentiment");
    for loc in &locations {
        println!(
            "{:>4}  {:<32} {:>9.4} {:>9.4}  {:<15} {:>9.3}",
            loc.id, loc.name, loc.latitude, loc.longitude, category_name(loc.category_id), loc.sentiment
        );
    }
    println!("{} location(s)", locations.len());
}

#[allow(clippy::too_many_arguments)]
fn optimize(
    catalog: &LocationCatalog,
    config: OptimizerConfig,
    preferred: &[CategoryId],
    required: &[LocationId],
    mode: TravelMode,
    output: Option<PathBuf>,
    visualize: Option<PathBuf>,
    report: bool,
) {
    let optimizer = RouteOptimizer::new(config, router());
    let (routes, run_report) = optimizer
        .optimize_routes_with_report(catalog, preferred, required, mode)
        .unwrap_or_else(|e| fail(e));

    if report {
        eprintln!("{}", run_report);
    }

    let json = serde_json::to_string_pretty(&routes).unwrap_or_else(|e| fail(e));
    match output {
        Some(path) => {
            std::fs::write(&path, &json).unwrap_or_else(|e| fail(e));
            println!("Routes saved to {:?}", path);
        }
        None => println!("{}", json),
    }

    if let Some(path) = visualize {
        let viz = Visualizer::new();
        let svg = viz.generate_routes_svg(catalog, &routes);
        match viz.save_svg(&svg, &path) {
            Ok(()) => println!("Visualization saved to {:?}", path),
            Err(e) => eprintln!("Failed to save visualization: {}", e),
        }
    }
}

fn recalculate(catalog: &LocationCatalog, ids: &[LocationId], mode: TravelMode) {
    let optimizer = RouteOptimizer::new(OptimizerConfig::default(), router());
    match optimizer.recalculate_geometry(catalog, ids, mode) {
        Ok(Some(data)) => match serde_json::to_string_pretty(&data) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        },
        Ok(None) => println!("null"),
        Err(e) => fail(e),
    }
}

fn run_benchmark(
    catalog: &LocationCatalog,
    base: OptimizerConfig,
    output: &Path,
    runs: usize,
    preferred: Vec<CategoryId>,
    baseline_start: LocationId,
    visualize: bool,
) {
    std::fs::create_dir_all(output).unwrap_or_else(|e| fail(format!("creating {:?}: {}", output, e)));

    let experiments = default_experiments(&base);
    let config = BenchmarkConfig {
        num_runs: runs,
        base_seed: base.seed,
        preferred_categories: preferred,
        baseline_start,
        show_progress: true,
        ..Default::default()
    };

    println!("Running {} experiments on {} locations...", experiments.len(), catalog.len());
    let mut benchmark = Benchmark::new(config);
    benchmark.run(catalog, &experiments).unwrap_or_else(|e| fail(e));

    let results_path = output.join("results.csv");
    match benchmark.export_to_csv(&results_path) {
        Ok(()) => println!("Results exported to {:?}", results_path),
        Err(e) => eprintln!("Failed to export results: {}", e),
    }

    let stats_path = output.join("statistics.csv");
    match benchmark.export_statistics_csv(&stats_path) {
        Ok(()) => println!("Statistics exported to {:?}", stats_path),
        Err(e) => eprintln!("Failed to export statistics: {}", e),
    }

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    match std::fs::write(&report_path, &report) {
        Ok(()) => println!("Report saved to {:?}", report_path),
        Err(e) => eprintln!("Failed to save report: {}", e),
    }

    if visualize {
        // One series per experiment, first seed only.
        let mut series: Vec<(String, Vec<Fitness>)> = Vec::new();
        for (result, front) in benchmark.results().iter().zip(benchmark.fronts()) {
            if !series.iter().any(|(name, _)| name == &result.experiment) {
                series.push((result.experiment.clone(), front.clone()));
            }
        }
        let baseline = benchmark.baseline().map(|b| ("Greedy", b.fitness));

        let viz = Visualizer::new();
        let svg = viz.generate_pareto_svg(&series, baseline);
        let svg_path = output.join("pareto.svg");
        match viz.save_svg(&svg, &svg_path) {
            Ok(()) => println!("Pareto plot saved to {:?}", svg_path),
            Err(e) => eprintln!("Failed to save Pareto plot: {}", e),
        }
        let png_path = output.join("pareto.png");
        if let Err(e) = viz.save_png(&svg, &png_path) {
            log::warn!("PNG export skipped: {}", e);
        }
    }
}

fn analyze_catalog(catalog: &LocationCatalog) {
    println!("========== Catalog Analysis ==========\n");
    println!("{}", catalog.statistics());

    let distances: Vec<f64> = catalog
        .iter()
        .flat_map(|a| catalog.iter().filter(move |b| a.id < b.id).map(move |b| a.planar_distance(b)))
        .collect();

    if !distances.is_empty() {
        let avg = distances.iter().sum::<f64>() / distances.len() as f64;
        let min = distances.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = distances.iter().cloned().fold(0.0, f64::max);

        println!("\nPairwise planar distance:");
        println!("  Average: {:.5}", avg);
        println!("  Min: {:.5}", min);
        println!("  Max: {:.5}", max);
    }

    let config = OptimizerConfig::default();
    if let Some(first) = catalog.iter().next() {
        let categories: Vec<CategoryId> = vec![first.category_id];
        if let Some(tour) = greedy_baseline(catalog, first.id, &categories, config.min_locations) {
            println!("\nGreedy tour from {} ({}):", first.name, category_name(first.category_id));
            println!("  {}", tour);
        }
    }
}
