//! Random construction of route candidates.

use crate::catalog::LocationId;
use crate::config::OptimizerConfig;
use crate::individual::Individual;
use crate::nsga::constraints::{enforce, RequiredStops};
use rand::prelude::*;
use std::collections::HashSet;

/// Builds valid variable-length candidates from a pool of ids.
pub struct ChromosomeFactory<'a> {
    all_ids: &'a [LocationId],
    required: &'a RequiredStops,
    min_locations: usize,
    max_locations: usize,
}

impl<'a> ChromosomeFactory<'a> {
    pub fn new(all_ids: &'a [LocationId], required: &'a RequiredStops, config: &OptimizerConfig) -> Self {
        ChromosomeFactory {
            all_ids,
            required,
            min_locations: config.min_locations,
            max_locations: config.max_locations,
        }
    }

    /// Create one individual.
    ///
    /// Starts from the required stops, draws a target length in
    /// `[min, max]`, fills the gap with distinct unused ids (as many as the
    /// pool still has), shuffles, then enforces constraints.
    pub fn create<R: Rng>(&self, rng: &mut R) -> Individual {
        let mut ids: Vec<LocationId> = self.required.ids().to_vec();
        let target = rng.gen_range(self.min_locations..=self.max_locations);

        let used: HashSet<LocationId> = ids.iter().copied().collect();
        let pool: Vec<LocationId> = self.all_ids.iter()
            .copied()
            .filter(|id| !used.contains(id))
            .collect();

        let needed = target.saturating_sub(ids.len()).min(pool.len());
        ids.extend(pool.choose_multiple(rng, needed).copied());
        ids.shuffle(rng);

        let mut individual = Individual::new(ids);
        enforce(&mut individual, self.required, self.max_locations);
        individual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    fn config() -> OptimizerConfig {
        OptimizerConfig::default()
    }

    #[test]
    fn test_created_individuals_respect_bounds() {
        let ids: Vec<LocationId> = (1..=30).collect();
        let required = RequiredStops::new(vec![4, 17]);
        let config = config();
        let factory = ChromosomeFactory::new(&ids, &required, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for _ in 0..200 {
            let ind = factory.create(&mut rng);
            assert!(ind.len() >= 5 && ind.len() <= 8, "bad length: {:?}", ind.ids);
            assert!(ind.is_duplicate_free());
            assert!(ind.contains(4) && ind.contains(17));
            assert!(!ind.is_evaluated());
        }
    }

    #[test]
    fn test_small_catalog_yields_shorter_individual() {
        let ids: Vec<LocationId> = vec![1, 2, 3];
        let required = RequiredStops::default();
        let config = config();
        let factory = ChromosomeFactory::new(&ids, &required, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let ind = factory.create(&mut rng);
        assert_eq!(ind.len(), 3);
        assert!(ind.is_duplicate_free());
    }

    #[test]
    fn test_order_is_shuffled() {
        let ids: Vec<LocationId> = (1..=8).collect();
        let required = RequiredStops::new(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let config = config();
        let factory = ChromosomeFactory::new(&ids, &required, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let distinct_orders: HashSet<Vec<LocationId>> =
            (0..20).map(|_| factory.create(&mut rng).ids).collect();
        assert!(distinct_orders.len() > 1);
    }

    #[test]
    fn test_same_seed_same_individual() {
        let ids: Vec<LocationId> = (1..=25).collect();
        let required = RequiredStops::new(vec![10]);
        let config = config();
        let factory = ChromosomeFactory::new(&ids, &required, &config);

        let a = factory.create(&mut ChaCha8Rng::seed_from_u64(77));
        let b = factory.create(&mut ChaCha8Rng::seed_from_u64(77));
        assert_eq!(a, b);
    }
}
