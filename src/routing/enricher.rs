//! Authoritative geometry for the finalists.

use crate::routing::{get_route_data, Coordinate, RouteData, RoutingProvider, TravelMode};
use rayon::prelude::*;

/// Fetches path geometry for a handful of finished routes.
///
/// Each route is requested independently and in parallel; a failed request
/// yields `None` for that route only.
pub struct RouteGeometryEnricher<'a> {
    provider: &'a dyn RoutingProvider,
}

impl<'a> RouteGeometryEnricher<'a> {
    pub fn new(provider: &'a dyn RoutingProvider) -> Self {
        RouteGeometryEnricher { provider }
    }

    /// Route data for one waypoint list.
    pub fn enrich_one(&self, waypoints: &[Coordinate], mode: TravelMode) -> Option<RouteData> {
        get_route_data(self.provider, waypoints, mode)
    }

    /// Route data for every waypoint list, in input order.
    pub fn enrich(&self, routes: &[Vec<Coordinate>], mode: TravelMode) -> Vec<Option<RouteData>> {
        routes
            .par_iter()
            .enumerate()
            .map(|(i, waypoints)| {
                let data = self.enrich_one(waypoints, mode);
                if data.is_none() && waypoints.len() >= 2 {
                    log::warn!("Finalist {} keeps its proxy distance ({} geometry unavailable)", i + 1, mode);
                }
                data
            })
            .collect()
    }
}
