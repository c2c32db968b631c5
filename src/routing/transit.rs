//! Multi-stop transit routing assembled from single legs.
//!
//! Transit directions APIs route one origin/destination pair at a time, so a
//! tour of n stops becomes n - 1 leg requests whose polylines are decoded and
//! joined. The first point of a leg is dropped when it repeats the last point
//! of the path so far.

use crate::error::RoutingError;
use crate::routing::{polyline, Coordinate, Geometry, RouteData, RoutingProvider, TravelMode};

/// One routed leg: distance in metres and its encoded polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub distance: f64,
    pub polyline: String,
}

/// A backend that routes a single origin/destination pair by transit.
pub trait LegRouter: Send + Sync {
    fn leg(&self, from: Coordinate, to: Coordinate) -> Result<Leg, RoutingError>;
}

/// [`RoutingProvider`] for [`TravelMode::Transit`] built on a [`LegRouter`].
pub struct TransitRouter<L> {
    legs: L,
}

impl<L: LegRouter> TransitRouter<L> {
    pub fn new(legs: L) -> Self {
        TransitRouter { legs }
    }

    /// Route every consecutive pair and join the decoded paths.
    pub fn route_legs(&self, coordinates: &[Coordinate]) -> Result<RouteData, RoutingError> {
        let mut path: Vec<Coordinate> = Vec::new();
        let mut distance = 0.0;

        for (i, pair) in coordinates.windows(2).enumerate() {
            let leg = self.legs.leg(pair[0], pair[1])?;
            let points = polyline::decode(&leg.polyline)?;
            if points.is_empty() {
                return Err(RoutingError::Transient(format!("transit leg {} has an empty path", i)));
            }
            distance += leg.distance;
            append_leg(&mut path, points);
        }

        Ok(RouteData {
            distance,
            geometry: Geometry::line_string(path),
        })
    }
}

/// Concatenate `leg` onto `path`, skipping a duplicated joint.
fn append_leg(path: &mut Vec<Coordinate>, leg: Vec<Coordinate>) {
    let skip = match (path.last(), leg.first()) {
        (Some(last), Some(first)) if last == first => 1,
        _ => 0,
    };
    path.extend(leg.into_iter().skip(skip));
}

impl<L: LegRouter> RoutingProvider for TransitRouter<L> {
    fn route(&self, coordinates: &[Coordinate], mode: TravelMode) -> Result<RouteData, RoutingError> {
        if mode != TravelMode::Transit {
            return Err(RoutingError::Configuration(format!("transit router cannot route {}", mode)));
        }
        self.route_legs(coordinates)
    }
}
