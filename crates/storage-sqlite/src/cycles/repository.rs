use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::billing_cycles;

use super::model::BillingCycleDB;
use cardsync_core::cycles::{BillingCycle, BillingCycleRepositoryTrait};
use cardsync_core::errors::Result;

/// Repository for billing cycles.
pub struct BillingCycleRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BillingCycleRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl BillingCycleRepositoryTrait for BillingCycleRepository {
    fn list_by_card(&self, card: &str) -> Result<Vec<BillingCycle>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = billing_cycles::table
            .select(BillingCycleDB::as_select())
            .filter(billing_cycles::card_id.eq(card))
            .order(billing_cycles::start_date.desc())
            .load::<BillingCycleDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(BillingCycle::from).collect())
    }

    async fn replace_for_card(&self, card: &str, cycles: Vec<BillingCycle>) -> Result<usize> {
        let card = card.to_string();
        let rows: Vec<BillingCycleDB> = cycles.into_iter().map(BillingCycleDB::from).collect();

        // Cycles are derived data: the reconciled set wholesale-replaces the
        // card's rows in one transaction.
        self.writer
            .exec(move |conn| {
                diesel::delete(billing_cycles::table.filter(billing_cycles::card_id.eq(&card)))
                    .execute(conn)
                    .into_core()?;

                let mut written = 0;
                for row in &rows {
                    written += diesel::insert_into(billing_cycles::table)
                        .values(row)
                        .execute(conn)
                        .into_core()?;
                }
                Ok(written)
            })
            .await
    }
}
