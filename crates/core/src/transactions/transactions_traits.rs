//! Traits for transaction persistence.
//!
//! Deliberately, no method on the repository deletes rows: the accumulation
//! invariant says the union of all sync windows over time approximates full
//! history, so nothing a sync does may remove a stored transaction.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::transactions_model::CardTransaction;
use crate::errors::Result;

/// Repository contract for card transactions.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Upsert a batch keyed on external transaction id. Returns rows written.
    ///
    /// The whole batch runs in one transaction; a failure rolls everything
    /// back and the caller falls back to per-record writes.
    async fn upsert_batch(&self, transactions: Vec<CardTransaction>) -> Result<usize>;

    /// Upsert a single transaction. The fallback path when a batch fails.
    async fn upsert_single(&self, transaction: CardTransaction) -> Result<()>;

    fn get_by_external_id(&self, external_id: &str) -> Result<Option<CardTransaction>>;
    fn list_by_card(&self, card_id: &str) -> Result<Vec<CardTransaction>>;
    fn list_by_connection(&self, connection_id: &str) -> Result<Vec<CardTransaction>>;

    /// Count stored transactions for a connection dated before `cutoff`.
    /// This is the preserved-history measure reported after each sync.
    fn count_older_than(&self, connection_id: &str, cutoff: NaiveDate) -> Result<i64>;

    /// Earliest transaction date for a card, used by open-date estimation.
    fn earliest_date_for_card(&self, card_id: &str) -> Result<Option<NaiveDate>>;

    fn count_for_card(&self, card_id: &str) -> Result<i64>;
}
