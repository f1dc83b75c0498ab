//! Traits for billing-cycle persistence.

use async_trait::async_trait;

use super::cycles_model::BillingCycle;
use crate::errors::Result;

/// Repository contract for billing cycles.
#[async_trait]
pub trait BillingCycleRepositoryTrait: Send + Sync {
    fn list_by_card(&self, card_id: &str) -> Result<Vec<BillingCycle>>;

    /// Replace a card's cycle rows with the reconciled canonical set, in one
    /// transaction. Cycles are derived data, so unlike transactions they may
    /// be rewritten wholesale.
    async fn replace_for_card(&self, card_id: &str, cycles: Vec<BillingCycle>) -> Result<usize>;
}
