//! APRs module - domain models and traits.

mod aprs_model;
mod aprs_traits;

// Re-export the public interface
pub use aprs_model::{AprRecord, NewApr};
pub use aprs_traits::AprRepositoryTrait;
