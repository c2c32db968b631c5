//! Greedy nearest-neighbour tour, used as a reference point for the
//! evolutionary search in benchmarks.

use crate::catalog::{CategoryId, LocationCatalog, LocationId};
use crate::individual::{Fitness, Individual};
use crate::nsga::fitness::FitnessEvaluator;
use ordered_float::OrderedFloat;
use std::collections::HashSet;

/// A tour built greedily together with its objective values.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineTour {
    pub route: Vec<LocationId>,
    pub fitness: Fitness,
}

impl std::fmt::Display for BaselineTour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Greedy {:?}  distance {:.5}  satisfaction {:.4}",
            self.route, self.fitness.distance, self.fitness.satisfaction
        )
    }
}

/// Start at `start_id` and keep moving to the nearest unvisited location of a
/// preferred category until `min_locations` stops are reached or none is left.
///
/// Returns `None` if `start_id` is not in the catalog. Distance is the planar
/// proxy; a single-stop tour therefore has distance 0 here rather than the
/// `+inf` the search assigns, since nothing was travelled.
pub fn greedy_baseline(
    catalog: &LocationCatalog,
    start_id: LocationId,
    preferred: &[CategoryId],
    min_locations: usize,
) -> Option<BaselineTour> {
    let start = catalog.get(start_id)?;
    let preferred_set: HashSet<CategoryId> = preferred.iter().copied().collect();

    let mut pool: Vec<_> = catalog.iter()
        .filter(|l| l.id != start_id && preferred_set.contains(&l.category_id))
        .collect();

    let mut route = vec![start_id];
    let mut current = start;
    let mut distance = 0.0;

    while route.len() < min_locations && !pool.is_empty() {
        let (idx, step) = pool.iter()
            .enumerate()
            .map(|(i, l)| (i, current.planar_distance(l)))
            .min_by_key(|&(_, d)| OrderedFloat(d))?;

        distance += step;
        current = pool.remove(idx);
        route.push(current.id);
    }

    let evaluator = FitnessEvaluator::new(catalog, preferred);
    let satisfaction = evaluator.satisfaction(&Individual::new(route.clone()));

    Some(BaselineTour {
        route,
        fitness: Fitness::new(distance, satisfaction),
    })
}
