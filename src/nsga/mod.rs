//! Evolutionary core: NSGA-II over variable-length routes.

pub mod constraints;
pub mod engine;
pub mod factory;
pub mod fitness;
pub mod operators;
pub mod pareto;
pub mod sorting;

pub use constraints::{enforce, RequiredStops};
pub use engine::Nsga2Engine;
pub use factory::ChromosomeFactory;
pub use fitness::FitnessEvaluator;
pub use operators::{mate, mutate, MutationType, OperatorParams};
pub use pareto::extract;
pub use sorting::{crowding_distance, non_dominated_sort, select_best, FrontAssignment, Ranking};
