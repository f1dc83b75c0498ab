use async_trait::async_trait;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::sync_leases;

use super::model::SyncLeaseDB;
use cardsync_core::errors::Result;
use cardsync_core::sync::{SyncLease, SyncLeaseRepositoryTrait};

/// Repository for per-connection sync leases.
pub struct SyncLeaseRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncLeaseRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SyncLeaseRepositoryTrait for SyncLeaseRepository {
    async fn try_acquire(&self, connection_id: &str, holder: &str) -> Result<Option<SyncLease>> {
        let connection = connection_id.to_string();
        let holder = holder.to_string();

        // The check and the write share the writer actor's transaction, so
        // two concurrent acquirers serialize and exactly one wins.
        self.writer
            .exec(move |conn| {
                let existing = sync_leases::table
                    .select(SyncLeaseDB::as_select())
                    .find(&connection)
                    .first::<SyncLeaseDB>(conn)
                    .optional()
                    .into_core()?;

                if let Some(row) = existing {
                    let lease: SyncLease = row.into();
                    if !lease.is_expired(chrono::Utc::now()) && lease.holder != holder {
                        debug!(
                            "Lease for connection {} held by {} until {}",
                            connection, lease.holder, lease.expires_at
                        );
                        return Ok(None);
                    }
                    // Expired or re-entrant: reclaim below.
                }

                let fresh = SyncLease::new(connection.clone(), holder.clone());
                let row: SyncLeaseDB = fresh.clone().into();
                diesel::insert_into(sync_leases::table)
                    .values(&row)
                    .on_conflict(sync_leases::connection_id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .into_core()?;

                Ok(Some(fresh))
            })
            .await
    }

    async fn release(&self, connection_id: &str, holder: &str) -> Result<()> {
        let connection = connection_id.to_string();
        let holder = holder.to_string();

        self.writer
            .exec(move |conn| {
                diesel::delete(
                    sync_leases::table
                        .filter(sync_leases::connection_id.eq(&connection))
                        .filter(sync_leases::holder.eq(&holder)),
                )
                .execute(conn)
                .into_core()?;
                Ok(())
            })
            .await
    }

    fn get(&self, connection_id: &str) -> Result<Option<SyncLease>> {
        let mut conn = get_connection(&self.pool)?;

        let row = sync_leases::table
            .select(SyncLeaseDB::as_select())
            .find(connection_id)
            .first::<SyncLeaseDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(row.map(SyncLease::from))
    }
}
