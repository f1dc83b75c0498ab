use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::aprs;

use super::model::AprDB;
use cardsync_core::aprs::{AprRecord, AprRepositoryTrait, NewApr};
use cardsync_core::errors::Result;

/// Repository for APR snapshots.
pub struct AprRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AprRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl AprRepositoryTrait for AprRepository {
    fn list_by_card(&self, card: &str) -> Result<Vec<AprRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = aprs::table
            .select(AprDB::as_select())
            .filter(aprs::card_id.eq(card))
            .order(aprs::apr_type.asc())
            .load::<AprDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(AprRecord::from).collect())
    }

    async fn replace_for_card(&self, card: &str, new_aprs: Vec<NewApr>) -> Result<usize> {
        let card = card.to_string();
        let rows: Vec<AprDB> = new_aprs
            .into_iter()
            .map(|n| AprDB::from_new(&card, n))
            .collect();

        // APR snapshots are not accumulated: delete + recreate atomically.
        self.writer
            .exec(move |conn| {
                diesel::delete(aprs::table.filter(aprs::card_id.eq(&card)))
                    .execute(conn)
                    .into_core()?;

                let mut written = 0;
                for row in &rows {
                    written += diesel::insert_into(aprs::table)
                        .values(row)
                        .execute(conn)
                        .into_core()?;
                }
                Ok(written)
            })
            .await
    }
}
