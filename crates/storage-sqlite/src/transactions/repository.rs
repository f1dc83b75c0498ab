//! Transaction repository.
//!
//! Deliberately exposes no delete operation. The accumulation invariant
//! depends on it: nothing a sync does may remove a stored transaction.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::upsert::excluded;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::card_transactions;
use crate::utils::{date_to_db, datetime_to_db, opt_date_from_db};

use super::model::CardTransactionDB;
use cardsync_core::errors::Result;
use cardsync_core::transactions::{CardTransaction, TransactionRepositoryTrait};

/// Repository for card transactions.
pub struct TransactionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// The conflict-resolving write both upsert paths share. Mutable fields
    /// track the aggregator; `created_at` keeps its original value.
    fn upsert_row(conn: &mut SqliteConnection, row: &CardTransactionDB) -> Result<usize> {
        diesel::insert_into(card_transactions::table)
            .values(row)
            .on_conflict(card_transactions::external_id)
            .do_update()
            .set((
                card_transactions::card_id.eq(excluded(card_transactions::card_id)),
                card_transactions::connection_id.eq(excluded(card_transactions::connection_id)),
                card_transactions::amount.eq(excluded(card_transactions::amount)),
                card_transactions::date.eq(excluded(card_transactions::date)),
                card_transactions::name.eq(excluded(card_transactions::name)),
                card_transactions::merchant_name.eq(excluded(card_transactions::merchant_name)),
                card_transactions::category_primary
                    .eq(excluded(card_transactions::category_primary)),
                card_transactions::category_detailed
                    .eq(excluded(card_transactions::category_detailed)),
                card_transactions::pending.eq(excluded(card_transactions::pending)),
                card_transactions::needs_review.eq(excluded(card_transactions::needs_review)),
                card_transactions::updated_at.eq(datetime_to_db(chrono::Utc::now())),
            ))
            .execute(conn)
            .into_core()
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    async fn upsert_batch(&self, transactions: Vec<CardTransaction>) -> Result<usize> {
        if transactions.is_empty() {
            return Ok(0);
        }
        let rows: Vec<CardTransactionDB> = transactions
            .into_iter()
            .map(CardTransactionDB::from)
            .collect();

        // The writer actor wraps the job in one transaction; any row error
        // rolls back the batch and the caller falls back to per-record writes.
        self.writer
            .exec(move |conn| {
                let mut written = 0;
                for row in &rows {
                    written += Self::upsert_row(conn, row)?;
                }
                Ok(written)
            })
            .await
    }

    async fn upsert_single(&self, transaction: CardTransaction) -> Result<()> {
        let row: CardTransactionDB = transaction.into();
        self.writer
            .exec(move |conn| {
                Self::upsert_row(conn, &row)?;
                Ok(())
            })
            .await
    }

    fn get_by_external_id(&self, external: &str) -> Result<Option<CardTransaction>> {
        let mut conn = get_connection(&self.pool)?;

        let row = card_transactions::table
            .select(CardTransactionDB::as_select())
            .find(external)
            .first::<CardTransactionDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(row.map(CardTransaction::from))
    }

    fn list_by_card(&self, card: &str) -> Result<Vec<CardTransaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = card_transactions::table
            .select(CardTransactionDB::as_select())
            .filter(card_transactions::card_id.eq(card))
            .order(card_transactions::date.desc())
            .load::<CardTransactionDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(CardTransaction::from).collect())
    }

    fn list_by_connection(&self, connection: &str) -> Result<Vec<CardTransaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = card_transactions::table
            .select(CardTransactionDB::as_select())
            .filter(card_transactions::connection_id.eq(connection))
            .order(card_transactions::date.desc())
            .load::<CardTransactionDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(CardTransaction::from).collect())
    }

    fn count_older_than(&self, connection: &str, cutoff: NaiveDate) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;

        // ISO dates compare correctly as text.
        card_transactions::table
            .filter(card_transactions::connection_id.eq(connection))
            .filter(card_transactions::date.lt(date_to_db(cutoff)))
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }

    fn earliest_date_for_card(&self, card: &str) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;

        let earliest: Option<String> = card_transactions::table
            .filter(card_transactions::card_id.eq(card))
            .select(diesel::dsl::min(card_transactions::date))
            .first(&mut conn)
            .into_core()?;

        Ok(opt_date_from_db(earliest))
    }

    fn count_for_card(&self, card: &str) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;

        card_transactions::table
            .filter(card_transactions::card_id.eq(card))
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }
}
