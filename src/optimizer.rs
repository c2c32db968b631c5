//! Service façade: list locations, optimize routes, recalculate geometry.
//!
//! Every call works on the catalog snapshot it is handed and on its own
//! [`OptimizerConfig`]; the optimizer keeps no state between calls besides
//! the routing provider, so calls can run concurrently.

use crate::catalog::{category_color, CategoryId, Location, LocationCatalog, LocationId};
use crate::config::OptimizerConfig;
use crate::error::{OptimizeError, ValidationError};
use crate::individual::Individual;
use crate::nsga::engine::Nsga2Engine;
use crate::routing::{Coordinate, Geometry, RouteData, RouteGeometryEnricher, RoutingProvider, TravelMode};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One stop of a returned route, as shown on a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub id: LocationId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub category_color: String,
}

impl From<&Location> for LocationSummary {
    fn from(loc: &Location) -> Self {
        LocationSummary {
            id: loc.id,
            name: loc.name.clone(),
            lat: loc.latitude,
            lon: loc.longitude,
            category_color: category_color(loc.category_id).to_string(),
        }
    }
}

/// One finalist route.
///
/// `distance` is the routed distance when geometry was fetched, otherwise the
/// planar proxy used during the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub id: usize,
    pub distance: f64,
    pub satisfaction: f64,
    pub locations: Vec<LocationSummary>,
    pub geometry: Option<Geometry>,
}

/// What happened during one optimization call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generations: usize,
    pub evaluations: usize,
    pub elapsed_secs: f64,
    /// Geometry enrichment ran (it is skipped once the deadline has passed).
    pub enriched: bool,
    pub deadline_hit: bool,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} generations, {} evaluations, {:.3}s, enriched: {}, deadline hit: {}",
            self.generations, self.evaluations, self.elapsed_secs, self.enriched, self.deadline_hit
        )
    }
}

/// Locations of a catalog, optionally restricted to some categories.
pub fn list_locations(catalog: &LocationCatalog, category_filter: Option<&[CategoryId]>) -> Vec<Location> {
    catalog.list_locations(category_filter).into_values().collect()
}

/// Multi-objective route optimizer bound to a routing provider.
pub struct RouteOptimizer<P> {
    config: OptimizerConfig,
    provider: P,
}

impl<P: RoutingProvider> RouteOptimizer<P> {
    pub fn new(config: OptimizerConfig, provider: P) -> Self {
        RouteOptimizer { config, provider }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Search for up to K non-dominated routes and attach their geometry.
    pub fn optimize_routes(
        &self,
        catalog: &LocationCatalog,
        preferred_categories: &[CategoryId],
        required_stops: &[LocationId],
        mode: TravelMode,
    ) -> Result<Vec<RouteResult>, OptimizeError> {
        self.optimize_routes_with_report(catalog, preferred_categories, required_stops, mode)
            .map(|(routes, _)| routes)
    }

    /// Same as [`optimize_routes`](Self::optimize_routes), plus run statistics.
    pub fn optimize_routes_with_report(
        &self,
        catalog: &LocationCatalog,
        preferred_categories: &[CategoryId],
        required_stops: &[LocationId],
        mode: TravelMode,
    ) -> Result<(Vec<RouteResult>, RunReport), OptimizeError> {
        let start = Instant::now();
        let mut engine = Nsga2Engine::new(catalog, preferred_categories, required_stops, self.config.clone())?;
        engine.run();
        let finalists = engine.pareto_front();

        let enrich = !engine.deadline_hit();
        let route_data: Vec<Option<RouteData>> = if enrich {
            let waypoints: Vec<Vec<Coordinate>> = finalists.iter().map(|ind| waypoints(catalog, ind)).collect();
            RouteGeometryEnricher::new(&self.provider).enrich(&waypoints, mode)
        } else {
            log::info!("Skipping geometry enrichment: deadline passed");
            vec![None; finalists.len()]
        };

        let routes = finalists
            .iter()
            .zip(route_data)
            .enumerate()
            .map(|(i, (ind, data))| build_result(catalog, i + 1, ind, data))
            .collect();

        let report = RunReport {
            generations: engine.current_generation(),
            evaluations: engine.evaluations(),
            elapsed_secs: start.elapsed().as_secs_f64(),
            enriched: enrich,
            deadline_hit: engine.deadline_hit(),
        };
        log::info!("Optimization done: {}", report);

        Ok((routes, report))
    }

    /// Geometry of an already chosen ordering; no optimization.
    ///
    /// Fewer than two ids returns `None` without contacting the provider.
    pub fn recalculate_geometry(
        &self,
        catalog: &LocationCatalog,
        ordered_ids: &[LocationId],
        mode: TravelMode,
    ) -> Result<Option<RouteData>, ValidationError> {
        if ordered_ids.len() < 2 {
            return Ok(None);
        }
        let mut coordinates = Vec::with_capacity(ordered_ids.len());
        for &id in ordered_ids {
            let loc = catalog.get(id).ok_or(ValidationError::UnknownLocation(id))?;
            coordinates.push(loc.lon_lat());
        }
        Ok(RouteGeometryEnricher::new(&self.provider).enrich_one(&coordinates, mode))
    }
}

fn waypoints(catalog: &LocationCatalog, individual: &Individual) -> Vec<Coordinate> {
    individual.ids
        .iter()
        .filter_map(|&id| catalog.get(id))
        .map(Location::lon_lat)
        .collect()
}

fn build_result(catalog: &LocationCatalog, id: usize, individual: &Individual, data: Option<RouteData>) -> RouteResult {
    let fitness = individual.fitness_or_worst();
    let (distance, geometry) = match data {
        Some(d) => (d.distance, Some(d.geometry)),
        // Fewer than two stops travel nothing; the search-time +inf stays internal.
        None if !fitness.distance.is_finite() => (0.0, None),
        None => (fitness.distance, None),
    };
    RouteResult {
        id,
        distance,
        satisfaction: fitness.satisfaction,
        locations: individual.ids
            .iter()
            .filter_map(|&loc_id| catalog.get(loc_id))
            .map(LocationSummary::from)
            .collect(),
        geometry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::mock::MockProvider;

    fn fast_config() -> OptimizerConfig {
        OptimizerConfig {
            population_size: 24,
            generations: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_failing_provider_still_returns_k_routes() {
        let catalog = LocationCatalog::sample();
        let optimizer = RouteOptimizer::new(fast_config(), MockProvider::failing());
        let routes = optimizer.optimize_routes(&catalog, &[1, 5], &[], TravelMode::Walking).unwrap();

        assert_eq!(routes.len(), 3);
        for (i, route) in routes.iter().enumerate() {
            assert_eq!(route.id, i + 1);
            assert!(route.geometry.is_none());
            assert!(route.distance.is_finite() && route.distance > 0.0);
            assert!(route.locations.len() >= 5 && route.locations.len() <= 8);
        }
        assert_eq!(optimizer.provider().calls(), 3);
    }

    #[test]
    fn test_working_provider_attaches_geometry() {
        let catalog = LocationCatalog::sample();
        let optimizer = RouteOptimizer::new(fast_config(), MockProvider::working());
        let (routes, report) = optimizer
            .optimize_routes_with_report(&catalog, &[2], &[8], TravelMode::Cycling)
            .unwrap();

        assert_eq!(routes.len(), 3);
        for route in &routes {
            let geometry = route.geometry.as_ref().unwrap();
            assert_eq!(geometry.coordinates().len(), route.locations.len());
            assert!(route.locations.iter().any(|l| l.id == 8));
        }
        assert!(report.enriched);
        assert!(!report.deadline_hit);
        assert_eq!(report.generations, 10);
        assert!(report.evaluations >= 24);
    }

    #[test]
    fn test_unknown_required_stop_is_rejected_before_work() {
        let catalog = LocationCatalog::sample();
        let optimizer = RouteOptimizer::new(fast_config(), MockProvider::working());
        let err = optimizer
            .optimize_routes(&catalog, &[1], &[2, 404], TravelMode::Walking)
            .unwrap_err();

        assert_eq!(err, OptimizeError::Validation(ValidationError::UnknownRequiredStop(404)));
        assert_eq!(optimizer.provider().calls(), 0);
    }

    #[test]
    fn test_results_are_reproducible() {
        let catalog = LocationCatalog::sample();
        let optimizer = RouteOptimizer::new(fast_config(), MockProvider::failing());
        let first = optimizer.optimize_routes(&catalog, &[3, 4], &[12], TravelMode::Walking).unwrap();
        let second = optimizer.optimize_routes(&catalog, &[3, 4], &[12], TravelMode::Walking).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_results_sorted_by_satisfaction() {
        let catalog = LocationCatalog::sample();
        let optimizer = RouteOptimizer::new(fast_config(), MockProvider::failing());
        let routes = optimizer.optimize_routes(&catalog, &[5], &[], TravelMode::Walking).unwrap();
        assert!(routes.windows(2).all(|w| w[0].satisfaction >= w[1].satisfaction));
    }

    #[test]
    fn test_deadline_skips_enrichment() {
        let catalog = LocationCatalog::sample();
        let config = OptimizerConfig { time_limit: Some(0.0), ..fast_config() };
        let optimizer = RouteOptimizer::new(config, MockProvider::working());
        let (routes, report) = optimizer
            .optimize_routes_with_report(&catalog, &[1], &[], TravelMode::Walking)
            .unwrap();

        assert_eq!(routes.len(), 3);
        assert!(routes.iter().all(|r| r.geometry.is_none()));
        assert!(report.deadline_hit);
        assert!(!report.enriched);
        assert_eq!(optimizer.provider().calls(), 0);
    }

    #[test]
    fn test_recalculate_geometry() {
        let catalog = LocationCatalog::sample();
        let optimizer = RouteOptimizer::new(fast_config(), MockProvider::working());

        assert_eq!(optimizer.recalculate_geometry(&catalog, &[3], TravelMode::Walking), Ok(None));
        assert_eq!(optimizer.recalculate_geometry(&catalog, &[], TravelMode::Walking), Ok(None));
        assert_eq!(optimizer.provider().calls(), 0);

        assert_eq!(
            optimizer.recalculate_geometry(&catalog, &[3, 77], TravelMode::Walking),
            Err(ValidationError::UnknownLocation(77))
        );
        assert_eq!(optimizer.provider().calls(), 0);

        let data = optimizer.recalculate_geometry(&catalog, &[3, 5, 1], TravelMode::Driving).unwrap().unwrap();
        assert_eq!(data.geometry.coordinates()[0], catalog.get(3).unwrap().lon_lat());
        assert_eq!(optimizer.provider().calls(), 1);
    }

    #[test]
    fn test_route_result_json_shape() {
        let catalog = LocationCatalog::sample();
        let ind = Individual {
            ids: vec![1, 5],
            fitness: Some(crate::individual::Fitness::new(0.05, 0.7)),
        };
        let result = build_result(&catalog, 1, &ind, None);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["distance"], 0.05);
        assert!(json["geometry"].is_null());
        assert_eq!(json["locations"][0]["categoryColor"], "#FF0000");
        assert_eq!(json["locations"][1]["categoryColor"], "#0000FF");
        assert!(json["locations"][0].get("lat").is_some());
    }

    #[test]
    fn test_single_stop_route_reports_finite_distance() {
        let catalog = LocationCatalog::new(vec![Location::new(1, "Only", 51.5, -0.12, 1, 0.8)]).unwrap();
        let optimizer = RouteOptimizer::new(fast_config(), MockProvider::failing());
        let routes = optimizer.optimize_routes(&catalog, &[1], &[], TravelMode::Walking).unwrap();

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].locations.len(), 1);
        assert_eq!(routes[0].distance, 0.0);
        assert!(routes[0].geometry.is_none());

        let json = serde_json::to_value(&routes[0]).unwrap();
        assert_eq!(json["distance"], 0.0);
        assert_eq!(optimizer.provider().calls(), 0);
    }

    #[test]
    fn test_list_locations_filter() {
        let catalog = LocationCatalog::sample();
        let art = list_locations(&catalog, Some(&[5]));
        assert_eq!(art.len(), 4);
        assert!(art.iter().all(|l| l.category_id == 5));
        assert_eq!(list_locations(&catalog, None).len(), 21);
    }
}
