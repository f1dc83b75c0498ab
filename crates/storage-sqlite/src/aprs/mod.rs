//! SQLite storage implementation for APR snapshots.

mod model;
mod repository;

pub use model::AprDB;
pub use repository::AprRepository;
