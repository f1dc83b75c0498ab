//! Card domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, Error, Result};

/// A credit-card account under a connection.
///
/// `credit_limit: None` is meaningful — it says the aggregator never
/// produced a valid limit — and is distinct from zero, which never occurs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub connection_id: String,
    /// Aggregator-side account id; at most one card exists per value
    pub external_account_id: String,
    pub name: String,
    pub mask: Option<String>,
    pub current_balance: Option<Decimal>,
    pub available_balance: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
    /// True when the user overrode the limit by hand
    pub is_manual_limit: bool,
    pub manual_limit: Option<Decimal>,
    pub last_statement_balance: Option<Decimal>,
    pub last_statement_date: Option<NaiveDate>,
    pub next_payment_due_date: Option<NaiveDate>,
    pub minimum_payment: Option<Decimal>,
    /// Account-origination date
    pub open_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input model for creating a card on first sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub connection_id: String,
    pub external_account_id: String,
    pub name: String,
    pub mask: Option<String>,
    pub current_balance: Option<Decimal>,
    pub available_balance: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
    pub last_statement_balance: Option<Decimal>,
    pub last_statement_date: Option<NaiveDate>,
    pub next_payment_due_date: Option<NaiveDate>,
    pub minimum_payment: Option<Decimal>,
    pub open_date: Option<NaiveDate>,
}

impl NewCard {
    pub fn validate(&self) -> Result<()> {
        if self.external_account_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "external_account_id".to_string(),
            )));
        }
        if self.connection_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "connection_id".to_string(),
            )));
        }
        Ok(())
    }
}

/// Per-account output of a sync pass, ready to apply to a card.
///
/// `extracted_limit: None` means the extraction cascade found nothing valid
/// for this sync, not that the limit should be cleared.
#[derive(Debug, Clone, Default)]
pub struct CardSyncUpdate {
    pub external_account_id: String,
    pub name: String,
    pub mask: Option<String>,
    pub current_balance: Option<Decimal>,
    pub available_balance: Option<Decimal>,
    pub extracted_limit: Option<Decimal>,
    pub last_statement_balance: Option<Decimal>,
    pub last_statement_date: Option<NaiveDate>,
    pub next_payment_due_date: Option<NaiveDate>,
    pub minimum_payment: Option<Decimal>,
    pub open_date: Option<NaiveDate>,
}
