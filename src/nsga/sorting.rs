//! Non-dominated sorting and crowding distance (Deb et al., 2002).
//!
//! Works directly on [`Fitness`] pairs with mixed objectives: distance is
//! minimized and satisfaction maximized through [`Fitness::dominates`].
//! Nothing is negated.
//!
//! - [`non_dominated_sort`]: successive Pareto fronts
//! - [`crowding_distance`]: density estimate inside one front
//! - [`Ranking`]: per-individual (rank, crowding) used by tournament selection
//! - [`select_best`]: elitist truncation used for environmental selection

use crate::individual::Fitness;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;

/// Fronts of a population. `fronts[0]` is the non-dominated set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontAssignment {
    /// Front index of each individual (0 = non-dominated).
    pub ranks: Vec<usize>,
    /// Individual indices grouped by front.
    pub fronts: Vec<Vec<usize>>,
}

/// Fast non-dominated sorting. O(n^2) dominance checks.
pub fn non_dominated_sort(fitness: &[Fitness]) -> FrontAssignment {
    let n = fitness.len();
    if n == 0 {
        return FrontAssignment::default();
    }

    let mut domination_count = vec![0usize; n];
    let mut dominates: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut ranks = vec![0usize; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if fitness[i].dominates(&fitness[j]) {
                dominates[i].push(j);
                domination_count[j] += 1;
            } else if fitness[j].dominates(&fitness[i]) {
                dominates[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    let mut fronts = Vec::new();

    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            for &j in &dominates[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    ranks[j] = fronts.len() + 1;
                    next.push(j);
                }
            }
        }
        next.sort_unstable();
        fronts.push(current);
        current = next;
    }

    FrontAssignment { ranks, fronts }
}

/// Crowding distance of each member of `front`, in the same order.
///
/// Boundary members of every objective get `+inf`. An objective whose range
/// is zero or not finite (e.g. a `+inf` distance in the front) adds nothing
/// to interior members.
pub fn crowding_distance(fitness: &[Fitness], front: &[usize]) -> Vec<f64> {
    let n = front.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let mut distances = vec![0.0f64; n];

    for obj in 0..2 {
        let value = |k: usize| fitness[front[k]].objectives()[obj];

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&k| OrderedFloat(value(k)));

        distances[order[0]] = f64::INFINITY;
        distances[order[n - 1]] = f64::INFINITY;

        let range = value(order[n - 1]) - value(order[0]);
        if !range.is_finite() || range <= 0.0 {
            continue;
        }
        for w in order.windows(3) {
            distances[w[1]] += (value(w[2]) - value(w[0])) / range;
        }
    }

    distances
}

/// Rank and crowding distance of every individual of a population.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    pub rank: Vec<usize>,
    pub crowding: Vec<f64>,
}

impl Ranking {
    pub fn new(fitness: &[Fitness]) -> Self {
        let fronts = non_dominated_sort(fitness);
        let mut crowding = vec![0.0; fitness.len()];
        for front in &fronts.fronts {
            for (&i, d) in front.iter().zip(crowding_distance(fitness, front)) {
                crowding[i] = d;
            }
        }
        Ranking { rank: fronts.ranks, crowding }
    }

    /// Crowded-comparison: lower rank wins, then larger crowding distance.
    /// `Ordering::Less` means `a` is preferred.
    pub fn crowded_cmp(&self, a: usize, b: usize) -> Ordering {
        self.rank[a]
            .cmp(&self.rank[b])
            .then_with(|| OrderedFloat(self.crowding[b]).cmp(&OrderedFloat(self.crowding[a])))
    }
}

/// Indices of the `count` survivors under NSGA-II elitist replacement.
///
/// Whole fronts are taken in rank order; the first front that does not fit
/// is truncated keeping the members with the largest crowding distance.
pub fn select_best(fitness: &[Fitness], count: usize) -> Vec<usize> {
    let mut selected = Vec::with_capacity(count.min(fitness.len()));

    for front in non_dominated_sort(fitness).fronts {
        let remaining = count - selected.len();
        if remaining == 0 {
            break;
        }
        if front.len() <= remaining {
            selected.extend(front);
            continue;
        }

        let distances = crowding_distance(fitness, &front);
        let mut order: Vec<usize> = (0..front.len()).collect();
        order.sort_by(|&a, &b| OrderedFloat(distances[b]).cmp(&OrderedFloat(distances[a])));
        selected.extend(order.into_iter().take(remaining).map(|k| front[k]));
        break;
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fits(values: &[(f64, f64)]) -> Vec<Fitness> {
        values.iter().map(|&(d, s)| Fitness::new(d, s)).collect()
    }

    #[test]
    fn test_empty_population() {
        let result = non_dominated_sort(&[]);
        assert!(result.fronts.is_empty());
        assert!(select_best(&[], 5).is_empty());
    }

    #[test]
    fn test_mixed_objectives_fronts() {
        // Short and satisfying dominates long and dull.
        let f = fits(&[(1.0, 0.9), (2.0, 0.5), (0.5, 0.2), (3.0, 0.1)]);
        let result = non_dominated_sort(&f);

        assert_eq!(result.fronts[0], vec![0, 2]);
        assert_eq!(result.ranks[1], 1);
        assert_eq!(result.ranks[3], 2);
        assert_eq!(result.fronts.len(), 3);
    }

    #[test]
    fn test_identical_fitness_share_front() {
        let f = fits(&[(1.0, 0.5), (1.0, 0.5), (1.0, 0.5)]);
        let result = non_dominated_sort(&f);
        assert_eq!(result.fronts.len(), 1);
        assert_eq!(result.fronts[0].len(), 3);
    }

    #[test]
    fn test_infinite_distance_ranked_last() {
        let f = fits(&[(f64::INFINITY, 0.9), (1.0, 0.9), (2.0, 0.3)]);
        let result = non_dominated_sort(&f);
        assert_eq!(result.ranks[1], 0);
        assert!(result.ranks[0] > 0);
    }

    #[test]
    fn test_crowding_boundaries_infinite() {
        let f = fits(&[(1.0, 0.1), (2.0, 0.5), (4.0, 0.9)]);
        let d = crowding_distance(&f, &[0, 1, 2]);
        assert!(d[0].is_infinite());
        assert!(d[2].is_infinite());
        // (4 - 1) / 3 + (0.9 - 0.1) / 0.8
        assert!((d[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_crowding_small_front() {
        let f = fits(&[(1.0, 0.1), (2.0, 0.5)]);
        assert!(crowding_distance(&f, &[0, 1]).iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_crowding_skips_infinite_range() {
        let f = fits(&[(1.0, 0.2), (f64::INFINITY, 0.9), (2.0, 0.4), (3.0, 0.6)]);
        let d = crowding_distance(&f, &[0, 1, 2, 3]);
        assert!(d.iter().all(|x| !x.is_nan()));
        // Interior members only get the satisfaction contribution.
        assert!((d[2] - (0.6 - 0.2) / 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_select_best_truncates_by_crowding() {
        // One front of four; the interior point closest to its neighbours goes.
        let f = fits(&[(1.0, 0.1), (2.0, 0.5), (2.1, 0.52), (4.0, 0.9)]);
        let survivors = select_best(&f, 3);
        assert_eq!(survivors.len(), 3);
        assert!(survivors.contains(&0));
        assert!(survivors.contains(&3));
    }

    #[test]
    fn test_select_best_prefers_lower_fronts() {
        let f = fits(&[(5.0, 0.1), (1.0, 0.9), (2.0, 0.5), (0.5, 0.3)]);
        let survivors = select_best(&f, 2);
        let mut sorted = survivors.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 3]);
    }

    #[test]
    fn test_crowded_cmp() {
        let f = fits(&[(1.0, 0.9), (2.0, 0.5), (0.5, 0.2)]);
        let ranking = Ranking::new(&f);
        assert_eq!(ranking.crowded_cmp(0, 1), Ordering::Less);
        assert_eq!(ranking.crowded_cmp(1, 2), Ordering::Greater);
        // Same front, both boundaries.
        assert_eq!(ranking.crowded_cmp(0, 2), Ordering::Equal);
    }
}
