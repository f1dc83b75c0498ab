//! Database row model for card transactions.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use cardsync_core::transactions::CardTransaction;

use crate::utils::{
    date_from_db, date_to_db, datetime_from_db, datetime_to_db, decimal_from_db, decimal_to_db,
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
#[diesel(table_name = crate::schema::card_transactions)]
#[diesel(primary_key(external_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CardTransactionDB {
    pub external_id: String,
    pub card_id: Option<String>,
    pub connection_id: String,
    pub amount: String,
    pub date: String,
    pub name: Option<String>,
    pub merchant_name: Option<String>,
    pub category_primary: Option<String>,
    pub category_detailed: Option<String>,
    pub pending: i32,
    pub needs_review: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CardTransactionDB> for CardTransaction {
    fn from(db: CardTransactionDB) -> Self {
        Self {
            external_id: db.external_id,
            card_id: db.card_id,
            connection_id: db.connection_id,
            amount: decimal_from_db(&db.amount),
            date: date_from_db(&db.date),
            name: db.name,
            merchant_name: db.merchant_name,
            category_primary: db.category_primary,
            category_detailed: db.category_detailed,
            pending: db.pending != 0,
            needs_review: db.needs_review != 0,
            created_at: datetime_from_db(&db.created_at),
            updated_at: datetime_from_db(&db.updated_at),
        }
    }
}

impl From<CardTransaction> for CardTransactionDB {
    fn from(domain: CardTransaction) -> Self {
        Self {
            external_id: domain.external_id,
            card_id: domain.card_id,
            connection_id: domain.connection_id,
            amount: decimal_to_db(domain.amount),
            date: date_to_db(domain.date),
            name: domain.name,
            merchant_name: domain.merchant_name,
            category_primary: domain.category_primary,
            category_detailed: domain.category_detailed,
            pending: domain.pending as i32,
            needs_review: domain.needs_review as i32,
            created_at: datetime_to_db(domain.created_at),
            updated_at: datetime_to_db(domain.updated_at),
        }
    }
}
