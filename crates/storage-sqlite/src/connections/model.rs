//! Database row model for connections.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use cardsync_core::connections::{Connection, ConnectionStatus, NewConnection};

use crate::utils::{datetime_from_db, datetime_to_db, opt_datetime_from_db};

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
#[diesel(table_name = crate::schema::connections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ConnectionDB {
    pub id: String,
    pub item_id: String,
    pub access_token: String,
    pub institution_id: Option<String>,
    pub institution_name: Option<String>,
    pub status: String,
    pub last_synced_at: Option<String>,
    pub last_error_code: Option<String>,
    pub last_error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ConnectionDB> for Connection {
    fn from(db: ConnectionDB) -> Self {
        Self {
            id: db.id,
            item_id: db.item_id,
            access_token: db.access_token,
            institution_id: db.institution_id,
            institution_name: db.institution_name,
            status: ConnectionStatus::from_str(&db.status),
            last_synced_at: opt_datetime_from_db(db.last_synced_at),
            last_error_code: db.last_error_code,
            last_error_message: db.last_error_message,
            created_at: datetime_from_db(&db.created_at),
            updated_at: datetime_from_db(&db.updated_at),
        }
    }
}

impl From<NewConnection> for ConnectionDB {
    fn from(domain: NewConnection) -> Self {
        let now = datetime_to_db(chrono::Utc::now());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            item_id: domain.item_id,
            access_token: domain.access_token,
            institution_id: domain.institution_id,
            institution_name: domain.institution_name,
            status: ConnectionStatus::Active.as_str().to_string(),
            last_synced_at: None,
            last_error_code: None,
            last_error_message: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
