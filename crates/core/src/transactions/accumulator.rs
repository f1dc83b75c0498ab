//! Transaction accumulation: validate, map, and upsert fetched transactions.
//!
//! "Accumulate" because storage only grows: transactions the aggregator no
//! longer returns stay put, so the union of all sync windows approximates
//! full history even when any single fetch is capped.

use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use cardsync_aggregator::models::TransactionData;

use super::transactions_model::{AccumulationReport, CardTransaction};
use super::transactions_traits::TransactionRepositoryTrait;
use crate::constants::AMOUNT_SANITY_CEILING;
use crate::errors::Result;

/// Accumulates fetched transactions into durable storage.
pub struct TransactionAccumulator {
    repository: Arc<dyn TransactionRepositoryTrait>,
}

impl TransactionAccumulator {
    pub fn new(repository: Arc<dyn TransactionRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Upsert `fetched` for a connection.
    ///
    /// `card_index` maps external account ids to local card ids; an
    /// unresolved account keeps the transaction with a null card reference
    /// rather than dropping it. `window_start` is the fetch window's start
    /// date, used for the preserved-history report.
    pub async fn accumulate(
        &self,
        connection_id: &str,
        card_index: &HashMap<String, String>,
        fetched: Vec<TransactionData>,
        window_start: NaiveDate,
    ) -> Result<AccumulationReport> {
        let mut report = AccumulationReport {
            fetched: fetched.len(),
            ..Default::default()
        };

        let mut rows: Vec<CardTransaction> = Vec::with_capacity(fetched.len());
        for data in fetched {
            match self.map_transaction(connection_id, card_index, data, &mut report) {
                Some(row) => rows.push(row),
                None => report.skipped += 1,
            }
        }

        report.stored = self.write_rows(rows).await?;

        report.preserved_older = self
            .repository
            .count_older_than(connection_id, window_start)?;
        info!(
            "Connection {}: stored {}/{} transactions ({} skipped, {} flagged), {} older than {} preserved",
            connection_id,
            report.stored,
            report.fetched,
            report.skipped,
            report.flagged_for_review,
            report.preserved_older,
            window_start
        );

        Ok(report)
    }

    /// Validate and map one wire transaction; `None` means skip.
    fn map_transaction(
        &self,
        connection_id: &str,
        card_index: &HashMap<String, String>,
        data: TransactionData,
        report: &mut AccumulationReport,
    ) -> Option<CardTransaction> {
        if data.transaction_id.trim().is_empty() {
            warn!("Skipping transaction with empty id");
            return None;
        }

        let Some(date) = data.date else {
            warn!("Skipping transaction {} with no date", data.transaction_id);
            return None;
        };

        let amount = match data.amount {
            Some(raw) if raw.is_finite() => match Decimal::from_f64(raw) {
                Some(amount) => amount,
                None => {
                    warn!(
                        "Skipping transaction {} with unrepresentable amount {}",
                        data.transaction_id, raw
                    );
                    return None;
                }
            },
            Some(raw) => {
                warn!(
                    "Skipping transaction {} with non-finite amount {}",
                    data.transaction_id, raw
                );
                return None;
            }
            None => {
                warn!(
                    "Skipping transaction {} with missing amount",
                    data.transaction_id
                );
                return None;
            }
        };

        if amount.abs() > Decimal::from(AMOUNT_SANITY_CEILING) {
            warn!(
                "Skipping transaction {} with implausible amount {}",
                data.transaction_id, amount
            );
            return None;
        }

        let needs_review = amount.is_zero();
        if needs_review {
            debug!(
                "Transaction {} has zero amount, flagging for review",
                data.transaction_id
            );
            report.flagged_for_review += 1;
        }

        let card_id = data
            .account_id
            .as_deref()
            .and_then(|ext| card_index.get(ext).cloned());
        if card_id.is_none() {
            warn!(
                "Transaction {} references unknown account {:?}, storing without card",
                data.transaction_id, data.account_id
            );
            report.unresolved_account += 1;
        }

        let now = chrono::Utc::now();
        let (category_primary, category_detailed) = data
            .category
            .map(|c| (c.primary, c.detailed))
            .unwrap_or((None, None));

        Some(CardTransaction {
            external_id: data.transaction_id,
            card_id,
            connection_id: connection_id.to_string(),
            amount,
            date,
            name: data.name,
            merchant_name: data.merchant_name,
            category_primary,
            category_detailed,
            pending: data.pending,
            needs_review,
            created_at: now,
            updated_at: now,
        })
    }

    /// Batched upsert with a per-record fallback so one malformed row can't
    /// sink the whole batch.
    async fn write_rows(&self, rows: Vec<CardTransaction>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        match self.repository.upsert_batch(rows.clone()).await {
            Ok(written) => Ok(written),
            Err(batch_err) => {
                error!(
                    "Batch upsert of {} transactions failed ({}), falling back to per-record writes",
                    rows.len(),
                    batch_err
                );
                let mut written = 0;
                for row in rows {
                    let external_id = row.external_id.clone();
                    match self.repository.upsert_single(row).await {
                        Ok(()) => written += 1,
                        Err(e) => {
                            error!("Failed to upsert transaction {}: {}", external_id, e);
                        }
                    }
                }
                Ok(written)
            }
        }
    }
}
