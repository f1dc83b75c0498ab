//! Cardsync Core - Domain entities, services, and traits.
//!
//! This crate contains the core business logic for cardsync.
//! It is database-agnostic and defines repository traits that are
//! implemented by the `storage-sqlite` crate.

pub mod aprs;
pub mod cards;
pub mod connections;
pub mod constants;
pub mod cycles;
pub mod errors;
pub mod extract;
pub mod institutions;
pub mod sync;
pub mod transactions;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
