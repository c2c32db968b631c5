//! Required-stop and length-bound repair.
//!
//! Crossover and mutation both avoid duplicates by filtering ids, which can
//! silently drop a mandatory stop. [`enforce`] runs after every one of them.

use crate::catalog::LocationId;
use crate::individual::Individual;
use std::collections::HashSet;

/// Mandatory stops of one optimization call, in the order the caller gave them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredStops {
    ordered: Vec<LocationId>,
    set: HashSet<LocationId>,
}

impl RequiredStops {
    /// Build from caller input; repeated ids are kept once.
    pub fn new(ids: Vec<LocationId>) -> Self {
        let mut set = HashSet::with_capacity(ids.len());
        let ordered = ids.into_iter().filter(|id| set.insert(*id)).collect();
        RequiredStops { ordered, set }
    }

    #[inline]
    pub fn contains(&self, id: LocationId) -> bool {
        self.set.contains(&id)
    }

    #[inline]
    pub fn ids(&self) -> &[LocationId] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// True if every required stop is present in `individual`.
    pub fn satisfied_by(&self, individual: &Individual) -> bool {
        self.ordered.iter().all(|&id| individual.contains(id))
    }
}

/// Append missing required stops, then trim non-required stops from the end
/// until the route fits `max_locations` or only required stops are left.
///
/// Deterministic and idempotent. Clears the fitness if anything changed.
pub fn enforce(individual: &mut Individual, required: &RequiredStops, max_locations: usize) {
    let mut changed = false;

    for &id in required.ids() {
        if !individual.contains(id) {
            individual.ids.push(id);
            changed = true;
        }
    }

    while individual.len() > max_locations {
        match individual.ids.iter().rposition(|&id| !required.contains(id)) {
            Some(pos) => {
                individual.ids.remove(pos);
                changed = true;
            }
            None => break,
        }
    }

    if changed {
        individual.invalidate();
    }
}
