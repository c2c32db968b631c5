//! Candidate route representation.
//!
//! An [`Individual`] is an ordered, duplicate-free sequence of location ids
//! together with an optional fitness pair. The fitness is cleared whenever the
//! sequence changes, so the engine only re-evaluates what actually moved.

use crate::catalog::LocationId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Objective values of an evaluated individual.
///
/// `distance` is minimized, `satisfaction` is maximized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fitness {
    pub distance: f64,
    pub satisfaction: f64,
}

impl Fitness {
    pub fn new(distance: f64, satisfaction: f64) -> Self {
        Fitness { distance, satisfaction }
    }

    /// Pareto dominance under (minimize distance, maximize satisfaction).
    ///
    /// `self` dominates `other` iff it is no worse on both objectives and
    /// strictly better on at least one.
    pub fn dominates(&self, other: &Fitness) -> bool {
        let no_worse = self.distance <= other.distance && self.satisfaction >= other.satisfaction;
        let better = self.distance < other.distance || self.satisfaction > other.satisfaction;
        no_worse && better
    }

    /// Objective vector used for crowding distance.
    pub fn objectives(&self) -> [f64; 2] {
        [self.distance, self.satisfaction]
    }
}

/// One candidate route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub ids: Vec<LocationId>,
    pub fitness: Option<Fitness>,
}

impl Individual {
    pub fn new(ids: Vec<LocationId>) -> Self {
        Individual { ids, fitness: None }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: LocationId) -> bool {
        self.ids.contains(&id)
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Drop the cached fitness after the id sequence changed.
    #[inline]
    pub fn invalidate(&mut self) {
        self.fitness = None;
    }

    /// Replace the id sequence, clearing fitness when it actually differs.
    pub fn set_ids(&mut self, ids: Vec<LocationId>) {
        if ids != self.ids {
            self.ids = ids;
            self.invalidate();
        }
    }

    /// True if no id appears twice.
    pub fn is_duplicate_free(&self) -> bool {
        let unique: HashSet<LocationId> = self.ids.iter().copied().collect();
        unique.len() == self.ids.len()
    }

    /// Position of a location in the route.
    pub fn position(&self, id: LocationId) -> Option<usize> {
        self.ids.iter().position(|&x| x == id)
    }

    /// Fitness, or a value worse than any real one when not yet evaluated.
    pub fn fitness_or_worst(&self) -> Fitness {
        self.fitness
            .unwrap_or(Fitness::new(f64::INFINITY, f64::NEG_INFINITY))
    }
}

impl std::fmt::Display for Individual {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Route {:?}", self.ids)?;
        match self.fitness {
            Some(fit) => write!(f, " (distance {:.5}, satisfaction {:.4})", fit.distance, fit.satisfaction),
            None => write!(f, " (not evaluated)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominance() {
        let a = Fitness::new(1.0, 0.8);
        let b = Fitness::new(2.0, 0.5);
        let c = Fitness::new(0.5, 0.3);

        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
        assert!(!a.dominates(&c));
        assert!(!c.dominates(&a));
    }

    #[test]
    fn test_equal_fitness_does_not_dominate() {
        let a = Fitness::new(1.0, 0.5);
        assert!(!a.dominates(&a));
    }

    #[test]
    fn test_one_strict_objective_is_enough() {
        let a = Fitness::new(1.0, 0.5);
        let same_distance_better_sat = Fitness::new(1.0, 0.6);
        let shorter_same_sat = Fitness::new(0.9, 0.5);
        assert!(same_distance_better_sat.dominates(&a));
        assert!(shorter_same_sat.dominates(&a));
    }

    #[test]
    fn test_set_ids_invalidates_only_on_change() {
        let mut ind = Individual::new(vec![1, 2, 3]);
        ind.fitness = Some(Fitness::new(1.0, 1.0));

        ind.set_ids(vec![1, 2, 3]);
        assert!(ind.is_evaluated());

        ind.set_ids(vec![3, 2, 1]);
        assert!(!ind.is_evaluated());
    }

    #[test]
    fn test_duplicate_detection() {
        assert!(Individual::new(vec![1, 2, 3]).is_duplicate_free());
        assert!(!Individual::new(vec![1, 2, 1]).is_duplicate_free());
        assert!(Individual::default().is_duplicate_free());
    }
}
