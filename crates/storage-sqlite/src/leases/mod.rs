//! SQLite storage implementation for sync leases.

mod model;
mod repository;

pub use model::SyncLeaseDB;
pub use repository::SyncLeaseRepository;
