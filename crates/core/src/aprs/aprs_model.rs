//! APR domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An APR snapshot for a card.
///
/// APRs are not accumulated historically: each sync fully replaces a card's
/// APR rows with the current snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AprRecord {
    pub id: String,
    pub card_id: String,
    /// e.g. "purchase_apr", "cash_advance_apr"
    pub apr_type: String,
    pub percentage: Decimal,
    pub balance_subject_to_apr: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Input model for one APR row in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApr {
    pub apr_type: String,
    pub percentage: Decimal,
    pub balance_subject_to_apr: Option<Decimal>,
}
