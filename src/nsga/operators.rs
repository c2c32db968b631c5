//! Genetic operators for variable-length, duplicate-free routes.
//!
//! - [`mate`]: order-preserving crossover that overwrites only the first parent
//! - [`mutate`]: ADD / REMOVE / SWAP of a single stop
//!
//! Neither operator knows about required stops beyond never picking them for
//! removal; callers run [`enforce`](crate::nsga::constraints::enforce)
//! afterwards.

use crate::catalog::LocationId;
use crate::config::OptimizerConfig;
use crate::individual::Individual;
use crate::nsga::constraints::RequiredStops;
use rand::prelude::*;
use std::collections::HashSet;

/// Which mutation branch was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    /// Insert one unused id
    Add,
    /// Drop one non-required id
    Remove,
    /// Replace one non-required id with an unused id
    Swap,
}

/// Length bounds and branch thresholds shared by the operators.
#[derive(Debug, Clone, Copy)]
pub struct OperatorParams {
    pub min_locations: usize,
    pub max_locations: usize,
    pub add_threshold: f64,
    pub remove_threshold: f64,
}

impl From<&OptimizerConfig> for OperatorParams {
    fn from(config: &OptimizerConfig) -> Self {
        OperatorParams {
            min_locations: config.min_locations,
            max_locations: config.max_locations,
            add_threshold: config.add_threshold,
            remove_threshold: config.remove_threshold,
        }
    }
}

/// Order crossover for routes of different lengths.
///
/// The shorter parent donates a slice `[lo, hi)` copied at the same
/// position; the remaining positions before and after it are filled, in
/// order, with the other parent's ids that are not in the slice. The child is
/// truncated to `max_locations` or topped up from the other parent towards
/// `min_locations`. Only `a` receives the child; both lose their fitness.
pub fn mate<R: Rng>(a: &mut Individual, b: &mut Individual, params: &OperatorParams, rng: &mut R) {
    let child = {
        let (parent1, parent2) = if a.len() <= b.len() {
            (&a.ids, &b.ids)
        } else {
            (&b.ids, &a.ids)
        };
        order_crossover(parent1, parent2, params, rng)
    };

    a.ids = child;
    a.invalidate();
    b.invalidate();
}

fn order_crossover<R: Rng>(
    parent1: &[LocationId],
    parent2: &[LocationId],
    params: &OperatorParams,
    rng: &mut R,
) -> Vec<LocationId> {
    let n = parent1.len();
    let (lo, hi) = if n >= 2 {
        let mut cuts = rand::seq::index::sample(rng, n, 2).into_vec();
        cuts.sort_unstable();
        (cuts[0], cuts[1])
    } else {
        (0, n)
    };

    let slice = &parent1[lo..hi];
    let in_slice: HashSet<LocationId> = slice.iter().copied().collect();
    let mut donor = parent2.iter().copied().filter(|id| !in_slice.contains(id));

    let mut child = Vec::with_capacity(n.max(params.min_locations));
    child.extend(donor.by_ref().take(lo));
    child.extend_from_slice(slice);
    child.extend(donor.by_ref().take(n - hi));

    if child.len() > params.max_locations {
        child.truncate(params.max_locations);
    } else if child.len() < params.min_locations {
        let missing = params.min_locations - child.len();
        child.extend(donor.take(missing));
    }

    child
}

/// Apply one randomly chosen mutation in place.
///
/// Returns the branch drawn and whether the route actually changed. Each
/// branch is a no-op when its precondition fails (no room to add, nothing
/// removable, nothing to swap in). Required stops are never removed or
/// swapped out.
pub fn mutate<R: Rng>(
    individual: &mut Individual,
    all_ids: &[LocationId],
    required: &RequiredStops,
    params: &OperatorParams,
    rng: &mut R,
) -> (MutationType, bool) {
    let r: f64 = rng.gen();
    let kind = if r < params.add_threshold {
        MutationType::Add
    } else if r < params.remove_threshold {
        MutationType::Remove
    } else {
        MutationType::Swap
    };

    let changed = match kind {
        MutationType::Add => mutate_add(individual, all_ids, params, rng),
        MutationType::Remove => mutate_remove(individual, required, params, rng),
        MutationType::Swap => mutate_swap(individual, all_ids, required, rng),
    };

    if changed {
        individual.invalidate();
    }
    (kind, changed)
}

fn unused_ids(individual: &Individual, all_ids: &[LocationId]) -> Vec<LocationId> {
    let present: HashSet<LocationId> = individual.ids.iter().copied().collect();
    all_ids.iter().copied().filter(|id| !present.contains(id)).collect()
}

fn removable_positions(individual: &Individual, required: &RequiredStops) -> Vec<usize> {
    individual.ids.iter()
        .enumerate()
        .filter(|(_, &id)| !required.contains(id))
        .map(|(i, _)| i)
        .collect()
}

fn mutate_add<R: Rng>(individual: &mut Individual, all_ids: &[LocationId], params: &OperatorParams, rng: &mut R) -> bool {
    if individual.len() >= params.max_locations {
        return false;
    }
    let unused = unused_ids(individual, all_ids);
    match unused.choose(rng) {
        Some(&id) => {
            let pos = rng.gen_range(0..=individual.len());
            individual.ids.insert(pos, id);
            true
        }
        None => false,
    }
}

fn mutate_remove<R: Rng>(individual: &mut Individual, required: &RequiredStops, params: &OperatorParams, rng: &mut R) -> bool {
    if individual.len() <= params.min_locations {
        return false;
    }
    match removable_positions(individual, required).choose(rng) {
        Some(&pos) => {
            individual.ids.remove(pos);
            true
        }
        None => false,
    }
}

fn mutate_swap<R: Rng>(individual: &mut Individual, all_ids: &[LocationId], required: &RequiredStops, rng: &mut R) -> bool {
    let positions = removable_positions(individual, required);
    let unused = unused_ids(individual, all_ids);
    if positions.is_empty() || unused.is_empty() {
        return false;
    }
    let pos = positions[rng.gen_range(0..positions.len())];
    let id = unused[rng.gen_range(0..unused.len())];
    individual.ids[pos] = id;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::individual::Fitness;
    use crate::nsga::constraints::enforce;
    use rand_chacha::ChaCha8Rng;

    fn params() -> OperatorParams {
        OperatorParams::from(&OptimizerConfig::default())
    }

    #[test]
    fn test_mate_child_is_valid() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let p = params();
        for _ in 0..200 {
            let mut a = Individual::new(vec![1, 2, 3, 4, 5, 6]);
            let mut b = Individual::new(vec![9, 8, 7, 6, 5, 4, 3, 2]);
            mate(&mut a, &mut b, &p, &mut rng);

            assert!(a.is_duplicate_free(), "duplicate in child {:?}", a.ids);
            assert!(a.len() >= 5 && a.len() <= 8);
            assert_eq!(b.ids, vec![9, 8, 7, 6, 5, 4, 3, 2]);
        }
    }

    #[test]
    fn test_mate_child_has_shorter_parent_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let p = params();
        let mut a = Individual::new(vec![10, 11, 12, 13, 14, 15, 16, 17]);
        let mut b = Individual::new(vec![1, 2, 3, 4, 5, 6]);
        mate(&mut a, &mut b, &p, &mut rng);

        assert_eq!(a.len(), 6);
        assert_eq!(b.ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_mate_uses_only_parent_ids() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let p = params();
        let parent1 = vec![1, 2, 3, 4, 5];
        let parent2 = vec![5, 4, 3, 2, 1, 6, 7];

        for _ in 0..50 {
            let mut a = Individual::new(parent1.clone());
            let mut b = Individual::new(parent2.clone());
            mate(&mut a, &mut b, &p, &mut rng);

            assert_eq!(a.len(), 5);
            assert!(a.is_duplicate_free());
            assert!(a.ids.iter().all(|id| parent1.contains(id) || parent2.contains(id)));
        }
    }

    #[test]
    fn test_order_crossover_fills_around_slice() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let p = params();
        let parent1 = [1, 2, 3, 4, 5, 6];
        let parent2 = [16, 15, 14, 13, 12, 11, 10];

        let child = order_crossover(&parent1, &parent2, &p, &mut rng);
        // Slice ids keep their positions; every other slot holds donor ids in donor order.
        let donor_part: Vec<LocationId> = child.iter().copied().filter(|id| *id >= 10).collect();
        let mut expected = donor_part.clone();
        expected.sort_unstable_by(|x, y| y.cmp(x));
        assert_eq!(donor_part, expected);
        for (i, id) in child.iter().enumerate() {
            if *id < 10 {
                assert_eq!(parent1[i], *id);
            }
        }
        assert_eq!(child.len(), 6);
    }

    #[test]
    fn test_mate_invalidates_both() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut a = Individual::new(vec![1, 2, 3, 4, 5]);
        let mut b = Individual::new(vec![5, 4, 3, 2, 1]);
        a.fitness = Some(Fitness::new(1.0, 1.0));
        b.fitness = Some(Fitness::new(1.0, 1.0));
        mate(&mut a, &mut b, &params(), &mut rng);
        assert!(!a.is_evaluated());
        assert!(!b.is_evaluated());
    }

    #[test]
    fn test_mate_tops_up_short_child() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut a = Individual::new(vec![1, 2, 3]);
        let mut b = Individual::new(vec![7, 8, 9, 1, 2, 3, 4]);
        mate(&mut a, &mut b, &params(), &mut rng);
        assert_eq!(a.len(), 5);
        assert!(a.is_duplicate_free());
    }

    #[test]
    fn test_mate_single_element_parents() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut a = Individual::new(vec![1]);
        let mut b = Individual::new(vec![2]);
        mate(&mut a, &mut b, &params(), &mut rng);
        assert_eq!(a.ids, vec![1, 2]);
    }

    #[test]
    fn test_mutation_never_drops_required() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let all: Vec<LocationId> = (1..=20).collect();
        let required = RequiredStops::new(vec![1, 2]);
        let p = params();

        let mut ind = Individual::new(vec![1, 2, 3, 4, 5, 6]);
        for _ in 0..500 {
            mutate(&mut ind, &all, &required, &p, &mut rng);
            assert!(ind.contains(1) && ind.contains(2));
            assert!(ind.is_duplicate_free());
            assert!(ind.len() >= 5 && ind.len() <= 8);
        }
    }

    #[test]
    fn test_add_noop_when_full() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let all: Vec<LocationId> = (1..=20).collect();
        let p = OperatorParams { add_threshold: 1.0, remove_threshold: 1.0, ..params() };
        let mut ind = Individual::new((1..=8).collect());
        ind.fitness = Some(Fitness::new(1.0, 1.0));

        let (kind, changed) = mutate(&mut ind, &all, &RequiredStops::default(), &p, &mut rng);
        assert_eq!(kind, MutationType::Add);
        assert!(!changed);
        assert!(ind.is_evaluated());
    }

    #[test]
    fn test_remove_noop_when_all_required() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let all: Vec<LocationId> = (1..=20).collect();
        let p = OperatorParams { add_threshold: 0.0, remove_threshold: 1.0, ..params() };
        let required = RequiredStops::new((1..=6).collect());
        let mut ind = Individual::new((1..=6).collect());

        let (kind, changed) = mutate(&mut ind, &all, &required, &p, &mut rng);
        assert_eq!(kind, MutationType::Remove);
        assert!(!changed);
        assert_eq!(ind.len(), 6);
    }

    #[test]
    fn test_swap_noop_without_unused_candidates() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let all: Vec<LocationId> = (1..=5).collect();
        let p = OperatorParams { add_threshold: 0.0, remove_threshold: 0.0, ..params() };
        let mut ind = Individual::new(vec![5, 4, 3, 2, 1]);

        let (kind, changed) = mutate(&mut ind, &all, &RequiredStops::default(), &p, &mut rng);
        assert_eq!(kind, MutationType::Swap);
        assert!(!changed);
        assert_eq!(ind.ids, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_swap_replaces_with_unused() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let all: Vec<LocationId> = (1..=6).collect();
        let p = OperatorParams { add_threshold: 0.0, remove_threshold: 0.0, ..params() };
        let mut ind = Individual::new(vec![1, 2, 3, 4, 5]);

        let (_, changed) = mutate(&mut ind, &all, &RequiredStops::default(), &p, &mut rng);
        assert!(changed);
        assert!(ind.contains(6));
        assert_eq!(ind.len(), 5);
    }

    #[test]
    fn test_crossover_then_enforce_restores_required() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let required = RequiredStops::new(vec![42]);
        let p = params();
        for _ in 0..100 {
            let mut a = Individual::new(vec![42, 1, 2, 3, 4]);
            let mut b = Individual::new(vec![5, 6, 7, 8, 9, 10, 11]);
            mate(&mut a, &mut b, &p, &mut rng);
            enforce(&mut a, &required, p.max_locations);
            enforce(&mut b, &required, p.max_locations);
            assert!(a.contains(42));
            assert!(b.contains(42));
            assert!(a.len() <= 8 && b.len() <= 8);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::nsga::constraints::enforce;
    use proptest::prelude::*;
    use proptest::sample::subsequence;
    use rand_chacha::ChaCha8Rng;

    fn route() -> impl Strategy<Value = Vec<LocationId>> {
        (subsequence((1..=30).collect::<Vec<LocationId>>(), 1..=8), any::<u64>()).prop_map(|(mut ids, seed)| {
            ids.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
            ids
        })
    }

    proptest! {
        #[test]
        fn crossover_then_enforce_keeps_invariants(a in route(), b in route(), seed in any::<u64>()) {
            let params = OperatorParams::from(&OptimizerConfig::default());
            let required = RequiredStops::new(vec![3, 17]);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let mut a = Individual::new(a);
            let mut b = Individual::new(b);
            mate(&mut a, &mut b, &params, &mut rng);
            enforce(&mut a, &required, params.max_locations);
            enforce(&mut b, &required, params.max_locations);

            for ind in [&a, &b] {
                prop_assert!(ind.is_duplicate_free());
                prop_assert!(required.satisfied_by(ind));
                prop_assert!(ind.len() <= params.max_locations);
                prop_assert!(!ind.is_evaluated());
            }
        }

        #[test]
        fn mutation_keeps_invariants(ids in route(), seed in any::<u64>(), rounds in 1usize..50) {
            let params = OperatorParams::from(&OptimizerConfig::default());
            let all: Vec<LocationId> = (1..=30).collect();
            let required = RequiredStops::new(vec![ids[0]]);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let mut ind = Individual::new(ids);
            for _ in 0..rounds {
                let before = ind.len();
                mutate(&mut ind, &all, &required, &params, &mut rng);
                enforce(&mut ind, &required, params.max_locations);

                prop_assert!(ind.is_duplicate_free());
                prop_assert!(required.satisfied_by(&ind));
                prop_assert!(ind.len() <= params.max_locations.max(before));
            }
        }
    }
}
