//! Transaction domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stored card transaction.
///
/// Keyed on the aggregator's transaction id. Sign convention follows the
/// aggregator: positive = spend, negative = payment/credit. Rows are only
/// ever inserted or updated — a sync never deletes them, so stored history
/// can exceed what any single fetch window returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTransaction {
    /// Aggregator-side transaction id (unique key)
    pub external_id: String,
    /// Owning card; null until the account mapping resolves
    pub card_id: Option<String>,
    pub connection_id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub name: Option<String>,
    pub merchant_name: Option<String>,
    pub category_primary: Option<String>,
    pub category_detailed: Option<String>,
    pub pending: bool,
    /// Set for zero-amount transactions so they surface for review
    pub needs_review: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of one accumulation pass over fetched transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulationReport {
    /// Transactions the fetcher handed over
    pub fetched: usize,
    /// Transactions written (inserted or updated)
    pub stored: usize,
    /// Transactions rejected by amount validation
    pub skipped: usize,
    /// Zero-amount transactions flagged for review
    pub flagged_for_review: usize,
    /// Transactions stored without a resolved card
    pub unresolved_account: usize,
    /// Stored transactions older than the current fetch window's start —
    /// the history this sync preserved beyond what the API returned
    pub preserved_older: i64,
}
