//! Optimizer and routing configuration.
//!
//! All algorithm parameters live in [`OptimizerConfig`], which is passed
//! into each optimization call. Nothing here is global, so concurrent calls
//! can run with independent parameters.

use crate::error::OptimizeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// NSGA-II and route-shape parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Population size
    pub population_size: usize,
    /// Number of generations
    pub generations: usize,
    /// Probability of applying crossover to a pair of offspring
    pub crossover_prob: f64,
    /// Probability of applying mutation to an offspring
    pub mutation_prob: f64,
    /// Minimum number of stops per route
    pub min_locations: usize,
    /// Maximum number of stops per route
    pub max_locations: usize,
    /// Number of finalists returned (K)
    pub result_count: usize,
    /// Random seed
    pub seed: u64,
    /// Wall-clock budget in seconds, checked between generations
    pub time_limit: Option<f64>,
    /// Evaluate offspring in parallel with rayon
    pub parallel: bool,
    /// Mutation draws below this value ADD a stop
    pub add_threshold: f64,
    /// Mutation draws below this value (and above `add_threshold`) REMOVE a stop; the rest SWAP
    pub remove_threshold: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            population_size: 100,
            generations: 50,
            crossover_prob: 0.9,
            mutation_prob: 0.2,
            min_locations: 5,
            max_locations: 8,
            result_count: 3,
            seed: 42,
            time_limit: None,
            parallel: true,
            add_threshold: 0.33,
            remove_threshold: 0.66,
        }
    }
}

impl OptimizerConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("Cannot open config file: {}", e))?;
        let config: OptimizerConfig = serde_json::from_str(&text)
            .map_err(|e| format!("Invalid config file: {}", e))?;
        Ok(config)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        let fail = |msg: String| Err(OptimizeError::Config(msg));

        if self.population_size == 0 {
            return fail("population_size must be greater than zero".into());
        }
        if self.min_locations == 0 || self.min_locations > self.max_locations {
            return fail(format!(
                "location bounds must satisfy 0 < min <= max (got {}..={})",
                self.min_locations, self.max_locations
            ));
        }
        for (name, p) in [
            ("crossover_prob", self.crossover_prob),
            ("mutation_prob", self.mutation_prob),
            ("add_threshold", self.add_threshold),
            ("remove_threshold", self.remove_threshold),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return fail(format!("{} must be within [0, 1] (got {})", name, p));
            }
        }
        if self.add_threshold > self.remove_threshold {
            return fail("add_threshold must not exceed remove_threshold".into());
        }
        if let Some(limit) = self.time_limit {
            if !(limit >= 0.0) {
                return fail(format!("time_limit must be non-negative (got {})", limit));
            }
        }
        Ok(())
    }
}

/// Credentials, endpoints and timeouts of the routing collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// OpenRouteService key (walking / cycling / driving)
    pub ors_api_key: Option<String>,
    /// Directions key for the per-leg transit provider
    pub transit_api_key: Option<String>,
    pub ors_base_url: String,
    pub transit_base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            ors_api_key: None,
            transit_api_key: None,
            ors_base_url: "https://api.openrouteservice.org".to_string(),
            transit_base_url: "https://maps.googleapis.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl RoutingConfig {
    /// Read `ORS_API_KEY`, `TRANSIT_API_KEY`, `ORS_BASE_URL`, `TRANSIT_BASE_URL`
    /// and `ROUTING_TIMEOUT_SECS`, keeping defaults for anything unset.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let defaults = RoutingConfig::default();

        let timeout_secs = match var("ROUTING_TIMEOUT_SECS").map(|v| v.parse::<u64>()) {
            Some(Ok(secs)) => secs,
            Some(Err(e)) => {
                log::warn!("Ignoring invalid ROUTING_TIMEOUT_SECS: {}", e);
                defaults.timeout_secs
            }
            None => defaults.timeout_secs,
        };

        RoutingConfig {
            ors_api_key: var("ORS_API_KEY"),
            transit_api_key: var("TRANSIT_API_KEY"),
            ors_base_url: var("ORS_BASE_URL").unwrap_or(defaults.ors_base_url),
            transit_base_url: var("TRANSIT_BASE_URL").unwrap_or(defaults.transit_base_url),
            timeout_secs,
        }
    }
}
