//! Traits for APR persistence.

use async_trait::async_trait;

use super::aprs_model::{AprRecord, NewApr};
use crate::errors::Result;

/// Repository contract for APR snapshots.
#[async_trait]
pub trait AprRepositoryTrait: Send + Sync {
    fn list_by_card(&self, card_id: &str) -> Result<Vec<AprRecord>>;

    /// Delete and recreate the card's APR rows in one transaction.
    async fn replace_for_card(&self, card_id: &str, aprs: Vec<NewApr>) -> Result<usize>;
}
