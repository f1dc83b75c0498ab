//! Database row model for billing cycles.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use cardsync_core::cycles::{BillingCycle, PaymentStatus};

use crate::utils::{
    date_from_db, date_to_db, datetime_from_db, datetime_to_db, decimal_from_db, decimal_to_db,
    opt_date_from_db, opt_date_to_db, opt_decimal_from_db, opt_decimal_to_db,
};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::billing_cycles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BillingCycleDB {
    pub id: String,
    pub card_id: String,
    pub start_date: String,
    pub end_date: String,
    pub total_spend: String,
    pub transaction_count: i64,
    pub statement_balance: Option<String>,
    pub minimum_payment: Option<String>,
    pub due_date: Option<String>,
    pub payment_status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BillingCycleDB> for BillingCycle {
    fn from(db: BillingCycleDB) -> Self {
        Self {
            id: db.id,
            card_id: db.card_id,
            start_date: date_from_db(&db.start_date),
            end_date: date_from_db(&db.end_date),
            total_spend: decimal_from_db(&db.total_spend),
            transaction_count: db.transaction_count,
            statement_balance: opt_decimal_from_db(db.statement_balance),
            minimum_payment: opt_decimal_from_db(db.minimum_payment),
            due_date: opt_date_from_db(db.due_date),
            payment_status: PaymentStatus::from_str(&db.payment_status),
            created_at: datetime_from_db(&db.created_at),
            updated_at: datetime_from_db(&db.updated_at),
        }
    }
}

impl From<BillingCycle> for BillingCycleDB {
    fn from(domain: BillingCycle) -> Self {
        Self {
            id: domain.id,
            card_id: domain.card_id,
            start_date: date_to_db(domain.start_date),
            end_date: date_to_db(domain.end_date),
            total_spend: decimal_to_db(domain.total_spend),
            transaction_count: domain.transaction_count,
            statement_balance: opt_decimal_to_db(domain.statement_balance),
            minimum_payment: opt_decimal_to_db(domain.minimum_payment),
            due_date: opt_date_to_db(domain.due_date),
            payment_status: domain.payment_status.as_str().to_string(),
            created_at: datetime_to_db(domain.created_at),
            updated_at: datetime_to_db(domain.updated_at),
        }
    }
}
