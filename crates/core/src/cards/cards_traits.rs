//! Traits for card persistence and services.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::cards_model::{Card, CardSyncUpdate, NewCard};
use crate::errors::Result;

/// Repository contract for cards.
#[async_trait]
pub trait CardRepositoryTrait: Send + Sync {
    fn get_by_id(&self, card_id: &str) -> Result<Card>;
    /// All cards sharing an external account id. More than one element
    /// means the duplicate invariant was violated and a merge is due.
    fn get_by_external_id(&self, external_account_id: &str) -> Result<Vec<Card>>;
    fn list_by_connection(&self, connection_id: &str) -> Result<Vec<Card>>;
    fn list_all(&self) -> Result<Vec<Card>>;
    async fn create(&self, new_card: NewCard) -> Result<Card>;
    async fn update(&self, card: Card) -> Result<Card>;
    async fn set_manual_limit(&self, card_id: &str, limit: Option<Decimal>) -> Result<()>;
    /// Repoint the duplicate's transactions, billing cycles, and APRs to the
    /// canonical card and remove the duplicate, in one transaction.
    async fn merge_into(&self, duplicate_id: &str, canonical_id: &str) -> Result<()>;
}

/// Service contract for card operations.
#[async_trait]
pub trait CardServiceTrait: Send + Sync {
    fn get_card(&self, card_id: &str) -> Result<Card>;
    fn get_cards_for_connection(&self, connection_id: &str) -> Result<Vec<Card>>;

    /// Create or update the card for one synced account, applying the
    /// manual-limit precedence rules.
    async fn apply_sync_update(
        &self,
        connection_id: &str,
        update: CardSyncUpdate,
    ) -> Result<Card>;

    /// Set a user-provided manual limit override.
    async fn set_manual_limit(&self, card_id: &str, limit: Decimal) -> Result<()>;

    /// Collapse duplicate cards (same external account id) down to the
    /// oldest-created record. Returns the number of duplicates merged.
    async fn dedupe_cards(&self) -> Result<usize>;
}
