use async_trait::async_trait;
use diesel::prelude::*;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{aprs, billing_cycles, card_transactions, cards};
use crate::utils::{datetime_to_db, opt_decimal_to_db};

use super::model::CardDB;
use cardsync_core::cards::{Card, CardRepositoryTrait, NewCard};
use cardsync_core::errors::Result;

/// Repository for managing card rows.
pub struct CardRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CardRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl CardRepositoryTrait for CardRepository {
    fn get_by_id(&self, card_id: &str) -> Result<Card> {
        let mut conn = get_connection(&self.pool)?;

        let row = cards::table
            .select(CardDB::as_select())
            .find(card_id)
            .first::<CardDB>(&mut conn)
            .into_core()?;

        Ok(row.into())
    }

    fn get_by_external_id(&self, external_account_id: &str) -> Result<Vec<Card>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = cards::table
            .select(CardDB::as_select())
            .filter(cards::external_account_id.eq(external_account_id))
            .order(cards::created_at.asc())
            .load::<CardDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(Card::from).collect())
    }

    fn list_by_connection(&self, connection_id: &str) -> Result<Vec<Card>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = cards::table
            .select(CardDB::as_select())
            .filter(cards::connection_id.eq(connection_id))
            .order(cards::name.asc())
            .load::<CardDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(Card::from).collect())
    }

    fn list_all(&self) -> Result<Vec<Card>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = cards::table
            .select(CardDB::as_select())
            .load::<CardDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(Card::from).collect())
    }

    async fn create(&self, new_card: NewCard) -> Result<Card> {
        new_card.validate()?;
        let row: CardDB = new_card.into();

        self.writer
            .exec(move |conn| {
                diesel::insert_into(cards::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(row.into())
            })
            .await
    }

    async fn update(&self, card: Card) -> Result<Card> {
        let row: CardDB = card.into();

        self.writer
            .exec(move |conn| {
                diesel::update(cards::table.find(&row.id))
                    .set(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(row.into())
            })
            .await
    }

    async fn set_manual_limit(&self, card_id: &str, limit: Option<Decimal>) -> Result<()> {
        let card_id = card_id.to_string();

        self.writer
            .exec(move |conn| {
                diesel::update(cards::table.find(&card_id))
                    .set((
                        cards::is_manual_limit.eq(limit.is_some() as i32),
                        cards::manual_limit.eq(opt_decimal_to_db(limit)),
                        cards::updated_at.eq(datetime_to_db(chrono::Utc::now())),
                    ))
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn merge_into(&self, duplicate_id: &str, canonical_id: &str) -> Result<()> {
        let duplicate = duplicate_id.to_string();
        let canonical = canonical_id.to_string();

        self.writer
            .exec(move |conn| {
                // Repoint children, then drop the duplicate. Transactions are
                // repointed, never deleted.
                let moved_txns = diesel::update(
                    card_transactions::table.filter(card_transactions::card_id.eq(&duplicate)),
                )
                .set(card_transactions::card_id.eq(&canonical))
                .execute(conn)
                .into_core()?;

                // Cycles and APR snapshots are derived data rebuilt on the
                // next sync; repointing cycles could collide with the
                // canonical card's rows on the (card, start, end) unique key.
                let dropped_cycles = diesel::delete(
                    billing_cycles::table.filter(billing_cycles::card_id.eq(&duplicate)),
                )
                .execute(conn)
                .into_core()?;

                diesel::delete(aprs::table.filter(aprs::card_id.eq(&duplicate)))
                    .execute(conn)
                    .into_core()?;

                diesel::delete(cards::table.find(&duplicate))
                    .execute(conn)
                    .into_core()?;

                debug!(
                    "Merged card {} into {}: {} transactions repointed, {} derived cycles dropped",
                    duplicate, canonical, moved_txns, dropped_cycles
                );
                Ok(())
            })
            .await
    }
}
