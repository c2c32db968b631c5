//! HTTP routing providers.
//!
//! - [`OpenRouteServiceClient`]: one multi-stop request per tour for walking,
//!   cycling and driving (`POST /v2/directions/{profile}/geojson`).
//! - [`TransitLegClient`]: one directions request per leg in transit mode,
//!   wrapped by [`TransitRouter`].
//! - [`ModeRouter`]: dispatches on [`TravelMode`] to whichever of the two is
//!   configured.
//!
//! All clients are blocking with a per-request timeout; they only run after
//! evolution has finished.

use crate::config::RoutingConfig;
use crate::error::RoutingError;
use crate::routing::transit::{Leg, LegRouter, TransitRouter};
use crate::routing::{Coordinate, Geometry, RouteData, RoutingProvider, TravelMode};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

fn build_client(timeout_secs: u64) -> Result<Client, RoutingError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("poi-route-optimizer/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

fn require_key(key: &Option<String>, name: &str) -> Result<String, RoutingError> {
    key.clone()
        .ok_or_else(|| RoutingError::Configuration(format!("{} is not set", name)))
}

// ---------------------------------------------------------------------------
// OpenRouteService
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OrsFeatureCollection {
    features: Vec<OrsFeature>,
}

#[derive(Debug, Deserialize)]
struct OrsFeature {
    geometry: Geometry,
    properties: OrsProperties,
}

#[derive(Debug, Deserialize)]
struct OrsProperties {
    summary: OrsSummary,
}

#[derive(Debug, Deserialize)]
struct OrsSummary {
    /// Absent when start and end coincide.
    #[serde(default)]
    distance: f64,
}

/// Extract the first route of an ORS GeoJSON directions response.
pub fn parse_ors_response(body: &str) -> Result<RouteData, RoutingError> {
    let collection: OrsFeatureCollection = serde_json::from_str(body)
        .map_err(|e| RoutingError::Transient(format!("malformed directions payload: {}", e)))?;
    let feature = collection.features
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::Transient("directions payload has no route".into()))?;
    Ok(RouteData {
        distance: feature.properties.summary.distance,
        geometry: feature.geometry,
    })
}

/// OpenRouteService directions client.
pub struct OpenRouteServiceClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenRouteServiceClient {
    pub fn new(config: &RoutingConfig) -> Result<Self, RoutingError> {
        let api_key = require_key(&config.ors_api_key, "ORS_API_KEY")?;
        Ok(OpenRouteServiceClient {
            client: build_client(config.timeout_secs)?,
            base_url: config.ors_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, profile: &str) -> String {
        format!("{}/v2/directions/{}/geojson", self.base_url, profile)
    }
}

impl RoutingProvider for OpenRouteServiceClient {
    fn route(&self, coordinates: &[Coordinate], mode: TravelMode) -> Result<RouteData, RoutingError> {
        let profile = mode.ors_profile().ok_or_else(|| {
            RoutingError::Configuration(format!("OpenRouteService has no profile for {}", mode))
        })?;

        let response = self.client
            .post(self.url(profile))
            .header("Authorization", &self.api_key)
            .json(&serde_json::json!({ "coordinates": coordinates }))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Transient(format!("directions request failed with HTTP {}", status)));
        }
        parse_ors_response(&response.text()?)
    }
}

// ---------------------------------------------------------------------------
// Transit legs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: EncodedPolyline,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct EncodedPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: f64,
}

/// Extract the first route of a directions response as a single leg.
pub fn parse_transit_response(body: &str) -> Result<Leg, RoutingError> {
    let response: DirectionsResponse = serde_json::from_str(body)
        .map_err(|e| RoutingError::Transient(format!("malformed transit payload: {}", e)))?;
    if response.status != "OK" {
        return Err(RoutingError::Transient(format!("transit status {}", response.status)));
    }
    let route = response.routes
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::Transient("transit payload has no route".into()))?;
    Ok(Leg {
        distance: route.legs.iter().map(|l| l.distance.value).sum(),
        polyline: route.overview_polyline.points,
    })
}

/// Directions client for single transit legs.
pub struct TransitLegClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TransitLegClient {
    pub fn new(config: &RoutingConfig) -> Result<Self, RoutingError> {
        let api_key = require_key(&config.transit_api_key, "TRANSIT_API_KEY")?;
        Ok(TransitLegClient {
            client: build_client(config.timeout_secs)?,
            base_url: config.transit_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

/// `lat,lon` as directions APIs expect it.
fn lat_lon(c: Coordinate) -> String {
    format!("{},{}", c[1], c[0])
}

impl LegRouter for TransitLegClient {
    fn leg(&self, from: Coordinate, to: Coordinate) -> Result<Leg, RoutingError> {
        let response = self.client
            .get(format!("{}/maps/api/directions/json", self.base_url))
            .query(&[
                ("origin", lat_lon(from)),
                ("destination", lat_lon(to)),
                ("mode", "transit".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Transient(format!("transit request failed with HTTP {}", status)));
        }
        parse_transit_response(&response.text()?)
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes each mode through the provider configured for it.
pub struct ModeRouter {
    road: Option<Box<dyn RoutingProvider>>,
    transit: Option<Box<dyn RoutingProvider>>,
}

impl ModeRouter {
    pub fn new(road: Option<Box<dyn RoutingProvider>>, transit: Option<Box<dyn RoutingProvider>>) -> Self {
        ModeRouter { road, transit }
    }

    /// Build every provider the configuration has credentials for. Missing
    /// credentials are logged; the affected modes then yield no geometry.
    pub fn from_config(config: &RoutingConfig) -> Self {
        let road = match OpenRouteServiceClient::new(config) {
            Ok(client) => Some(Box::new(client) as Box<dyn RoutingProvider>),
            Err(e) => {
                log::warn!("Walking/cycling/driving geometry disabled: {}", e);
                None
            }
        };
        let transit = match TransitLegClient::new(config) {
            Ok(client) => Some(Box::new(TransitRouter::new(client)) as Box<dyn RoutingProvider>),
            Err(e) => {
                log::warn!("Transit geometry disabled: {}", e);
                None
            }
        };
        ModeRouter { road, transit }
    }

    /// True if `mode` has a provider behind it.
    pub fn supports(&self, mode: TravelMode) -> bool {
        match mode {
            TravelMode::Transit => self.transit.is_some(),
            _ => self.road.is_some(),
        }
    }
}

impl RoutingProvider for ModeRouter {
    fn route(&self, coordinates: &[Coordinate], mode: TravelMode) -> Result<RouteData, RoutingError> {
        let provider = match mode {
            TravelMode::Transit => self.transit.as_ref(),
            _ => self.road.as_ref(),
        };
        match provider {
            Some(p) => p.route(coordinates, mode),
            None => Err(RoutingError::Configuration(format!("no provider configured for {}", mode))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::mock::MockProvider;

    #[test]
    fn test_parse_ors_response() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "bbox": [-0.13, 51.50, -0.12, 51.51],
                "properties": {"summary": {"distance": 1234.5, "duration": 880.1}, "way_points": [0, 2]},
                "geometry": {"type": "LineString", "coordinates": [[-0.1276, 51.5007], [-0.128, 51.503], [-0.1281, 51.5081]]}
            }]
        }"#;
        let data = parse_ors_response(body).unwrap();
        assert_eq!(data.distance, 1234.5);
        assert_eq!(data.geometry.coordinates().len(), 3);
    }

    #[test]
    fn test_parse_ors_malformed() {
        assert!(matches!(parse_ors_response("<html>"), Err(RoutingError::Transient(_))));
        assert!(parse_ors_response(r#"{"features": []}"#).is_err());
    }

    #[test]
    fn test_parse_transit_response() {
        let body = r#"{
            "status": "OK",
            "routes": [{
                "overview_polyline": {"points": "_p~iF~ps|U_ulLnnqC"},
                "legs": [{"distance": {"text": "2.1 km", "value": 2100}}]
            }]
        }"#;
        let leg = parse_transit_response(body).unwrap();
        assert_eq!(leg.distance, 2100.0);
        assert_eq!(leg.polyline, "_p~iF~ps|U_ulLnnqC");
    }

    #[test]
    fn test_parse_transit_error_status() {
        let body = r#"{"status": "ZERO_RESULTS", "routes": []}"#;
        assert!(matches!(parse_transit_response(body), Err(RoutingError::Transient(_))));
    }

    #[test]
    fn test_clients_require_keys() {
        let config = RoutingConfig::default();
        assert!(matches!(OpenRouteServiceClient::new(&config), Err(RoutingError::Configuration(_))));
        assert!(matches!(TransitLegClient::new(&config), Err(RoutingError::Configuration(_))));

        let router = ModeRouter::from_config(&config);
        assert!(!router.supports(TravelMode::Walking));
        assert!(matches!(
            router.route(&[[0.0, 0.0], [1.0, 1.0]], TravelMode::Transit),
            Err(RoutingError::Configuration(_))
        ));
    }

    #[test]
    fn test_mode_router_dispatch() {
        let router = ModeRouter::new(Some(Box::new(MockProvider::working())), None);
        assert!(router.supports(TravelMode::Cycling));
        assert!(!router.supports(TravelMode::Transit));
        assert!(router.route(&[[0.0, 0.0], [1.0, 1.0]], TravelMode::Cycling).is_ok());
        assert!(router.route(&[[0.0, 0.0], [1.0, 1.0]], TravelMode::Transit).is_err());
    }

    #[test]
    fn test_lat_lon_order() {
        assert_eq!(lat_lon([-0.1276, 51.5007]), "51.5007,-0.1276");
    }
}
