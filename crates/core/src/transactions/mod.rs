//! Transactions module - domain models, accumulator service, and traits.

mod accumulator;
mod transactions_model;
mod transactions_traits;

#[cfg(test)]
mod accumulator_tests;

// Re-export the public interface
pub use accumulator::TransactionAccumulator;
pub use transactions_model::{AccumulationReport, CardTransaction};
pub use transactions_traits::TransactionRepositoryTrait;
