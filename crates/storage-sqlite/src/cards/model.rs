//! Database row model for cards.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use cardsync_core::cards::{Card, NewCard};

use crate::utils::{
    datetime_from_db, datetime_to_db, opt_date_from_db, opt_date_to_db, opt_decimal_from_db,
    opt_decimal_to_db,
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
#[diesel(table_name = crate::schema::cards)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CardDB {
    pub id: String,
    pub connection_id: String,
    pub external_account_id: String,
    pub name: String,
    pub mask: Option<String>,
    pub current_balance: Option<String>,
    pub available_balance: Option<String>,
    pub credit_limit: Option<String>,
    pub is_manual_limit: i32,
    pub manual_limit: Option<String>,
    pub last_statement_balance: Option<String>,
    pub last_statement_date: Option<String>,
    pub next_payment_due_date: Option<String>,
    pub minimum_payment: Option<String>,
    pub open_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CardDB> for Card {
    fn from(db: CardDB) -> Self {
        Self {
            id: db.id,
            connection_id: db.connection_id,
            external_account_id: db.external_account_id,
            name: db.name,
            mask: db.mask,
            current_balance: opt_decimal_from_db(db.current_balance),
            available_balance: opt_decimal_from_db(db.available_balance),
            credit_limit: opt_decimal_from_db(db.credit_limit),
            is_manual_limit: db.is_manual_limit != 0,
            manual_limit: opt_decimal_from_db(db.manual_limit),
            last_statement_balance: opt_decimal_from_db(db.last_statement_balance),
            last_statement_date: opt_date_from_db(db.last_statement_date),
            next_payment_due_date: opt_date_from_db(db.next_payment_due_date),
            minimum_payment: opt_decimal_from_db(db.minimum_payment),
            open_date: opt_date_from_db(db.open_date),
            created_at: datetime_from_db(&db.created_at),
            updated_at: datetime_from_db(&db.updated_at),
        }
    }
}

impl From<Card> for CardDB {
    fn from(domain: Card) -> Self {
        Self {
            id: domain.id,
            connection_id: domain.connection_id,
            external_account_id: domain.external_account_id,
            name: domain.name,
            mask: domain.mask,
            current_balance: opt_decimal_to_db(domain.current_balance),
            available_balance: opt_decimal_to_db(domain.available_balance),
            credit_limit: opt_decimal_to_db(domain.credit_limit),
            is_manual_limit: domain.is_manual_limit as i32,
            manual_limit: opt_decimal_to_db(domain.manual_limit),
            last_statement_balance: opt_decimal_to_db(domain.last_statement_balance),
            last_statement_date: opt_date_to_db(domain.last_statement_date),
            next_payment_due_date: opt_date_to_db(domain.next_payment_due_date),
            minimum_payment: opt_decimal_to_db(domain.minimum_payment),
            open_date: opt_date_to_db(domain.open_date),
            created_at: datetime_to_db(domain.created_at),
            updated_at: datetime_to_db(chrono::Utc::now()),
        }
    }
}

impl From<NewCard> for CardDB {
    fn from(domain: NewCard) -> Self {
        let now = datetime_to_db(chrono::Utc::now());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            connection_id: domain.connection_id,
            external_account_id: domain.external_account_id,
            name: domain.name,
            mask: domain.mask,
            current_balance: opt_decimal_to_db(domain.current_balance),
            available_balance: opt_decimal_to_db(domain.available_balance),
            credit_limit: opt_decimal_to_db(domain.credit_limit),
            is_manual_limit: 0,
            manual_limit: None,
            last_statement_balance: opt_decimal_to_db(domain.last_statement_balance),
            last_statement_date: opt_date_to_db(domain.last_statement_date),
            next_payment_due_date: opt_date_to_db(domain.next_payment_due_date),
            minimum_payment: opt_decimal_to_db(domain.minimum_payment),
            open_date: opt_date_to_db(domain.open_date),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
