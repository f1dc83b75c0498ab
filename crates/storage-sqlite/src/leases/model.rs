//! Database row model for sync leases.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use cardsync_core::sync::SyncLease;

use crate::utils::{datetime_from_db, datetime_to_db};

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
#[diesel(table_name = crate::schema::sync_leases)]
#[diesel(primary_key(connection_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncLeaseDB {
    pub connection_id: String,
    pub holder: String,
    pub acquired_at: String,
    pub expires_at: String,
}

impl From<SyncLeaseDB> for SyncLease {
    fn from(db: SyncLeaseDB) -> Self {
        Self {
            connection_id: db.connection_id,
            holder: db.holder,
            acquired_at: datetime_from_db(&db.acquired_at),
            expires_at: datetime_from_db(&db.expires_at),
        }
    }
}

impl From<SyncLease> for SyncLeaseDB {
    fn from(domain: SyncLease) -> Self {
        Self {
            connection_id: domain.connection_id,
            holder: domain.holder,
            acquired_at: datetime_to_db(domain.acquired_at),
            expires_at: datetime_to_db(domain.expires_at),
        }
    }
}
