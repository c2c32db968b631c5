//! Finalist extraction from the last population.

use crate::catalog::LocationId;
use crate::individual::Individual;
use crate::nsga::sorting::non_dominated_sort;
use ordered_float::OrderedFloat;
use std::collections::HashSet;

/// Up to `k` finalists: the non-dominated, non-empty, distinct routes sorted
/// by satisfaction (highest first), padded with the next-best routes of the
/// whole population when the front is too small.
///
/// `k` counts distinct routes, so fewer than `k` come back when the
/// population holds fewer distinct non-empty id sequences.
pub fn extract(population: &[Individual], k: usize) -> Vec<Individual> {
    let fitness: Vec<_> = population.iter().map(Individual::fitness_or_worst).collect();
    let fronts = non_dominated_sort(&fitness);

    let mut taken: HashSet<usize> = HashSet::new();
    let mut seen: HashSet<&[LocationId]> = HashSet::new();

    let mut front: Vec<usize> = fronts.fronts
        .first()
        .map(|f| f.iter().copied().filter(|&i| !population[i].is_empty()).collect())
        .unwrap_or_default();
    front.sort_unstable();
    front.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(fitness[i].satisfaction)));

    let mut finalists: Vec<usize> = Vec::with_capacity(k);
    for i in front {
        if seen.insert(population[i].ids.as_slice()) {
            taken.insert(i);
            finalists.push(i);
        }
    }
    finalists.truncate(k);

    if finalists.len() < k {
        let mut rest: Vec<usize> = (0..population.len()).filter(|i| !taken.contains(i)).collect();
        rest.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(fitness[i].satisfaction)));
        for i in rest {
            if finalists.len() == k {
                break;
            }
            if !population[i].is_empty() && seen.insert(population[i].ids.as_slice()) {
                finalists.push(i);
            }
        }
    }

    finalists.into_iter().map(|i| population[i].clone()).collect()
}
