//! Objective evaluation: proxy distance and satisfaction.

use crate::catalog::{CategoryId, Location, LocationCatalog, LocationId};
use crate::individual::{Fitness, Individual};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Evaluates individuals against one catalog snapshot and one set of
/// preferred categories.
///
/// Shared by reference across rayon workers; the evaluation counter is the
/// only interior state.
#[derive(Debug)]
pub struct FitnessEvaluator<'a> {
    catalog: &'a LocationCatalog,
    preferred: HashSet<CategoryId>,
    evaluations: AtomicUsize,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(catalog: &'a LocationCatalog, preferred_categories: &[CategoryId]) -> Self {
        FitnessEvaluator {
            catalog,
            preferred: preferred_categories.iter().copied().collect(),
            evaluations: AtomicUsize::new(0),
        }
    }

    /// Number of `evaluate` calls so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    fn location(&self, id: LocationId) -> &'a Location {
        match self.catalog.get(id) {
            Some(loc) => loc,
            // Enforcement only ever inserts catalog ids.
            None => panic!("location {} evaluated but not in the catalog", id),
        }
    }

    /// Sum of planar segment lengths; `+inf` for fewer than two stops.
    pub fn distance(&self, individual: &Individual) -> f64 {
        if individual.len() < 2 {
            return f64::INFINITY;
        }
        individual.ids
            .windows(2)
            .map(|w| self.location(w[0]).planar_distance(self.location(w[1])))
            .sum()
    }

    /// Mean of `(category match + sentiment) / 2` over the stops; 0 when empty.
    pub fn satisfaction(&self, individual: &Individual) -> f64 {
        if individual.is_empty() {
            return 0.0;
        }
        let total: f64 = individual.ids
            .iter()
            .map(|&id| {
                let loc = self.location(id);
                let category_match = if self.preferred.contains(&loc.category_id) { 1.0 } else { 0.0 };
                (category_match + loc.sentiment) / 2.0
            })
            .sum();
        total / individual.len() as f64
    }

    pub fn evaluate(&self, individual: &Individual) -> Fitness {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        Fitness::new(self.distance(individual), self.satisfaction(individual))
    }

    /// Evaluate and store the fitness if it is missing. Returns true if work was done.
    pub fn ensure_evaluated(&self, individual: &mut Individual) -> bool {
        if individual.is_evaluated() {
            return false;
        }
        individual.fitness = Some(self.evaluate(individual));
        true
    }
}
