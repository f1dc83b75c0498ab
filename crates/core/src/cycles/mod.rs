//! Billing cycles module - domain models, reconciler, and traits.

mod cycles_model;
mod cycles_traits;
mod reconciler;

// Re-export the public interface
pub use cycles_model::{BillingCycle, PaymentStatus};
pub use cycles_traits::BillingCycleRepositoryTrait;
pub use reconciler::reconcile_cycles;
