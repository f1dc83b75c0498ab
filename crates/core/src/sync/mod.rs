//! Sync domain models: leases and reports.

mod lease_model;
mod report_model;

pub use lease_model::{SyncLease, SyncLeaseRepositoryTrait};
pub use report_model::{SyncOutcome, SyncReport};
