//! POI Route Optimizer Library
//!
//! Multi-objective search for sightseeing routes over a catalog of points of
//! interest. Each candidate route trades travel distance (minimized) against
//! satisfaction (maximized), where satisfaction blends how well the stops match
//! the caller's preferred categories with their crowd sentiment.
//!
//! # Features
//!
//! - NSGA-II with variable-length order crossover and add/remove/swap mutation
//! - Mandatory stops that survive every genetic operation
//! - Geometry enrichment of the finalists through pluggable routing providers
//!   (OpenRouteService profiles, per-leg transit directions)
//! - Greedy baseline, parameter-sweep benchmarks with hypervolume, SVG plots
//!
//! # Example
//!
//! ```no_run
//! use poi_route_optimizer::catalog::LocationCatalog;
//! use poi_route_optimizer::config::{OptimizerConfig, RoutingConfig};
//! use poi_route_optimizer::optimizer::RouteOptimizer;
//! use poi_route_optimizer::routing::{ModeRouter, TravelMode};
//!
//! let catalog = LocationCatalog::sample();
//! let router = ModeRouter::from_config(&RoutingConfig::from_env());
//! let optimizer = RouteOptimizer::new(OptimizerConfig::default(), router);
//!
//! let routes = optimizer
//!     .optimize_routes(&catalog, &[2, 5], &[5], TravelMode::Walking)
//!     .unwrap();
//! for route in &routes {
//!     println!("{}: {:.4} / {:.3}", route.id, route.distance, route.satisfaction);
//! }
//! ```

pub mod baseline;
pub mod benchmark;
pub mod catalog;
pub mod config;
pub mod error;
pub mod individual;
pub mod nsga;
pub mod optimizer;
pub mod routing;
pub mod visualization;

pub use catalog::{Location, LocationCatalog};
pub use config::{OptimizerConfig, RoutingConfig};
pub use error::{OptimizeError, RoutingError, ValidationError};
pub use individual::{Fitness, Individual};
pub use optimizer::{RouteOptimizer, RouteResult};
pub use routing::{RoutingProvider, TravelMode};
