//! Routing collaborators used after evolution to fetch real path geometry.
//!
//! The optimizer only sees the [`RoutingProvider`] contract. Concrete
//! providers live in [`http`] (OpenRouteService for walking, cycling and
//! driving; a per-leg directions API for transit) and are combined by
//! [`ModeRouter`]. Failures never leave this module as errors:
//! [`get_route_data`] turns them into `None`.

pub mod enricher;
pub mod http;
pub mod polyline;
pub mod transit;

use crate::error::RoutingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use enricher::RouteGeometryEnricher;
pub use http::{ModeRouter, OpenRouteServiceClient, TransitLegClient};
pub use transit::{Leg, LegRouter, TransitRouter};

/// `[longitude, latitude]`, the GeoJSON coordinate order.
pub type Coordinate = [f64; 2];

/// How the tour is travelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walking,
    Cycling,
    Driving,
    Transit,
}

impl TravelMode {
    pub const ALL: [TravelMode; 4] = [
        TravelMode::Walking,
        TravelMode::Cycling,
        TravelMode::Driving,
        TravelMode::Transit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Cycling => "cycling",
            TravelMode::Driving => "driving",
            TravelMode::Transit => "transit",
        }
    }

    /// OpenRouteService profile; `None` for transit, which has no multi-stop call.
    pub fn ors_profile(self) -> Option<&'static str> {
        match self {
            TravelMode::Walking => Some("foot-walking"),
            TravelMode::Cycling => Some("cycling-regular"),
            TravelMode::Driving => Some("driving-car"),
            TravelMode::Transit => None,
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walking" => Ok(TravelMode::Walking),
            "cycling" => Ok(TravelMode::Cycling),
            "driving" => Ok(TravelMode::Driving),
            "transit" => Ok(TravelMode::Transit),
            other => Err(format!("unknown travel mode '{}'", other)),
        }
    }
}

/// GeoJSON geometry of a routed path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString { coordinates: Vec<Coordinate> },
}

impl Geometry {
    pub fn line_string(coordinates: Vec<Coordinate>) -> Self {
        Geometry::LineString { coordinates }
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        match self {
            Geometry::LineString { coordinates } => coordinates,
        }
    }
}

/// Authoritative distance (metres) and path of one routed tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteData {
    pub distance: f64,
    pub geometry: Geometry,
}

/// A routing backend able to route an ordered list of waypoints.
pub trait RoutingProvider: Send + Sync {
    /// Route through `coordinates` in order. Called with at least two waypoints.
    fn route(&self, coordinates: &[Coordinate], mode: TravelMode) -> Result<RouteData, RoutingError>;
}

impl<P: RoutingProvider + ?Sized> RoutingProvider for &P {
    fn route(&self, coordinates: &[Coordinate], mode: TravelMode) -> Result<RouteData, RoutingError> {
        (**self).route(coordinates, mode)
    }
}

impl<P: RoutingProvider + ?Sized> RoutingProvider for Box<P> {
    fn route(&self, coordinates: &[Coordinate], mode: TravelMode) -> Result<RouteData, RoutingError> {
        (**self).route(coordinates, mode)
    }
}

/// Route data for a waypoint list, or `None` if there is nothing to route
/// (fewer than two waypoints) or the provider failed.
pub fn get_route_data<P: RoutingProvider + ?Sized>(
    provider: &P,
    coordinates: &[Coordinate],
    mode: TravelMode,
) -> Option<RouteData> {
    if coordinates.len() < 2 {
        return None;
    }
    match provider.route(coordinates, mode) {
        Ok(data) => Some(data),
        Err(e) => {
            log::warn!("No {} geometry for {} waypoints: {}", mode, coordinates.len(), e);
            None
        }
    }
}
