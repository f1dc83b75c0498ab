//! Database row model for APR snapshots.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use cardsync_core::aprs::{AprRecord, NewApr};

use crate::utils::{
    datetime_from_db, datetime_to_db, decimal_from_db, decimal_to_db, opt_decimal_from_db,
    opt_decimal_to_db,
};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::aprs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AprDB {
    pub id: String,
    pub card_id: String,
    pub apr_type: String,
    pub percentage: String,
    pub balance_subject_to_apr: Option<String>,
    pub created_at: String,
}

impl From<AprDB> for AprRecord {
    fn from(db: AprDB) -> Self {
        Self {
            id: db.id,
            card_id: db.card_id,
            apr_type: db.apr_type,
            percentage: decimal_from_db(&db.percentage),
            balance_subject_to_apr: opt_decimal_from_db(db.balance_subject_to_apr),
            created_at: datetime_from_db(&db.created_at),
        }
    }
}

impl AprDB {
    pub fn from_new(card_id: &str, new: NewApr) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            card_id: card_id.to_string(),
            apr_type: new.apr_type,
            percentage: decimal_to_db(new.percentage),
            balance_subject_to_apr: opt_decimal_to_db(new.balance_subject_to_apr),
            created_at: datetime_to_db(chrono::Utc::now()),
        }
    }
}
