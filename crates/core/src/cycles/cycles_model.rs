//! Billing-cycle domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment state of a billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Cycle is open or the statement isn't due yet
    #[default]
    Current,
    /// Statement issued, payment not yet made
    Due,
    /// Statement paid in full
    Paid,
    /// Payment missed or partial past the due date
    Outstanding,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "CURRENT",
            Self::Due => "DUE",
            Self::Paid => "PAID",
            Self::Outstanding => "OUTSTANDING",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "DUE" => Self::Due,
            "PAID" => Self::Paid,
            "OUTSTANDING" => Self::Outstanding,
            _ => Self::Current,
        }
    }
}

/// A statement period for a card.
///
/// Different fetch scopes can produce overlapping records for the same
/// logical cycle; the reconciler collapses them to one record per
/// `(card_id, start_date, end_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingCycle {
    pub id: String,
    pub card_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_spend: Decimal,
    pub transaction_count: i64,
    /// Present only once the cycle has closed and statement data exists
    pub statement_balance: Option<Decimal>,
    pub minimum_payment: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillingCycle {
    /// The dedupe key used by the reconciler, at day granularity.
    pub fn key(&self) -> (String, NaiveDate, NaiveDate) {
        (self.card_id.clone(), self.start_date, self.end_date)
    }

    /// True when the record carries cycle-closing statement data.
    pub fn has_closing_data(&self) -> bool {
        self.statement_balance.is_some()
            || self.minimum_payment.is_some()
            || self.due_date.is_some()
    }
}
