//! Per-connection sync service.
//!
//! One sync runs the whole pipeline for a single connection, serialized
//! under that connection's lease: accounts + liabilities + balances, card
//! upsert through the extraction cascades, APR replacement, chunked
//! transaction fetch + accumulation, and billing-cycle reconciliation.
//! Accounts under one connection share one credential and one rate-limit
//! budget, so nothing here runs in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, Months, NaiveDate};
use log::{info, warn};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use cardsync_aggregator::models::{AccountData, LiabilitiesData};
use cardsync_aggregator::{AggregatorClient, RetryExecutor, RetryPolicy};
use cardsync_core::aprs::{AprRepositoryTrait, NewApr};
use cardsync_core::cards::{
    CardRepositoryTrait, CardService, CardServiceTrait, CardSyncUpdate,
};
use cardsync_core::connections::{Connection, ConnectionService, ConnectionServiceTrait};
use cardsync_core::constants::{DEFAULT_LOOKBACK_MONTHS, SYNC_OVERLAP_DAYS};
use cardsync_core::cycles::{reconcile_cycles, BillingCycleRepositoryTrait};
use cardsync_core::errors::{Error, Result};
use cardsync_core::extract::{
    extract_credit_limit, extract_open_date, AccountBundle, OpenDateInputs,
};
use cardsync_core::institutions::classify;
use cardsync_core::sync::{SyncLeaseRepositoryTrait, SyncOutcome, SyncReport};
use cardsync_core::transactions::{TransactionAccumulator, TransactionRepositoryTrait};
use cardsync_storage_sqlite::aprs::AprRepository;
use cardsync_storage_sqlite::cards::CardRepository;
use cardsync_storage_sqlite::connections::ConnectionRepository;
use cardsync_storage_sqlite::cycles::BillingCycleRepository;
use cardsync_storage_sqlite::db::{DbPool, WriteHandle};
use cardsync_storage_sqlite::leases::SyncLeaseRepository;
use cardsync_storage_sqlite::transactions::TransactionRepository;

use super::cycles::{build_history_cycles, build_recent_cycles};
use super::fetcher::ChunkedTransactionFetcher;
use super::progress::{NoOpProgressReporter, SyncProgressPayload, SyncProgressReporter};

/// Output of the card-sync stage, consumed by later stages.
pub(crate) struct CardStageOutcome {
    /// external account id -> local card id
    pub card_index: HashMap<String, String>,
    /// Liabilities response, kept for cycle construction
    pub liabilities: LiabilitiesData,
    pub warnings: Vec<String>,
}

/// Service for syncing one connection's data to the local database.
pub struct CardSyncService {
    client: Arc<dyn AggregatorClient>,
    retry: RetryExecutor,
    fetcher: ChunkedTransactionFetcher,
    connection_service: Arc<dyn ConnectionServiceTrait>,
    card_service: Arc<dyn CardServiceTrait>,
    card_repository: Arc<dyn CardRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    accumulator: TransactionAccumulator,
    cycle_repository: Arc<dyn BillingCycleRepositoryTrait>,
    apr_repository: Arc<dyn AprRepositoryTrait>,
    lease_repository: Arc<dyn SyncLeaseRepositoryTrait>,
    progress: Arc<dyn SyncProgressReporter>,
}

impl CardSyncService {
    /// Build the service with concrete SQLite repositories.
    pub fn new(client: Arc<dyn AggregatorClient>, pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        let card_repository: Arc<dyn CardRepositoryTrait> =
            Arc::new(CardRepository::new(pool.clone(), writer.clone()));
        let transaction_repository: Arc<dyn TransactionRepositoryTrait> =
            Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
        let connection_repository =
            Arc::new(ConnectionRepository::new(pool.clone(), writer.clone()));

        Self::from_parts(
            client,
            Arc::new(ConnectionService::new(connection_repository)),
            Arc::new(CardService::new(card_repository.clone())),
            card_repository,
            transaction_repository,
            Arc::new(BillingCycleRepository::new(pool.clone(), writer.clone())),
            Arc::new(AprRepository::new(pool.clone(), writer.clone())),
            Arc::new(SyncLeaseRepository::new(pool, writer)),
        )
    }

    /// Build the service from explicit collaborators (used by tests and the
    /// reconnection validator).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        client: Arc<dyn AggregatorClient>,
        connection_service: Arc<dyn ConnectionServiceTrait>,
        card_service: Arc<dyn CardServiceTrait>,
        card_repository: Arc<dyn CardRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        cycle_repository: Arc<dyn BillingCycleRepositoryTrait>,
        apr_repository: Arc<dyn AprRepositoryTrait>,
        lease_repository: Arc<dyn SyncLeaseRepositoryTrait>,
    ) -> Self {
        let retry = RetryExecutor::new(RetryPolicy::default());
        Self {
            fetcher: ChunkedTransactionFetcher::new(client.clone(), retry.clone()),
            accumulator: TransactionAccumulator::new(transaction_repository.clone()),
            client,
            retry,
            connection_service,
            card_service,
            card_repository,
            transaction_repository,
            cycle_repository,
            apr_repository,
            lease_repository,
            progress: Arc::new(NoOpProgressReporter),
        }
    }

    /// Sets the progress reporter.
    pub fn with_progress_reporter(mut self, progress: Arc<dyn SyncProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Run a full sync for one connection.
    ///
    /// Returns `Ok` with an outcome of `Success`, `Degraded`, or
    /// `NeedsReconnection`; hard failures (after recording the connection
    /// error) propagate as `Err`.
    pub async fn sync_connection(
        &self,
        connection: &Connection,
        access_token: &str,
    ) -> Result<SyncReport> {
        let holder = uuid::Uuid::new_v4().to_string();
        if self
            .lease_repository
            .try_acquire(&connection.id, &holder)
            .await?
            .is_none()
        {
            return Err(Error::LeaseHeld(connection.id.clone()));
        }

        let result = self.sync_connection_inner(connection, access_token).await;

        if let Err(e) = self.lease_repository.release(&connection.id, &holder).await {
            warn!("Failed to release sync lease for {}: {}", connection.id, e);
        }

        match result {
            Ok(report) => {
                self.connection_service
                    .record_sync_success(&connection.id)
                    .await?;
                info!(
                    "Sync for connection {} finished: {:?} ({} cards, {} transactions stored)",
                    connection.id, report.outcome, report.cards_synced, report.transactions.stored
                );
                self.progress.report_sync_complete(&report);
                Ok(report)
            }
            Err(e) if is_reconnect_error(&e) => {
                warn!(
                    "Connection {} requires reconnection: {}",
                    connection.id, e
                );
                self.connection_service
                    .record_sync_failure(&connection.id, "ITEM_LOGIN_REQUIRED", &e.to_string(), true)
                    .await?;
                let mut report = SyncReport::new(connection.id.clone());
                report.outcome = SyncOutcome::NeedsReconnection;
                report.error = Some(e.to_string());
                self.progress.report_sync_complete(&report);
                Ok(report)
            }
            Err(e) => {
                self.connection_service
                    .record_sync_failure(&connection.id, "SYNC_FAILED", &e.to_string(), false)
                    .await?;
                Err(e)
            }
        }
    }

    async fn sync_connection_inner(
        &self,
        connection: &Connection,
        access_token: &str,
    ) -> Result<SyncReport> {
        let mut report = SyncReport::new(connection.id.clone());
        let today = chrono::Utc::now().date_naive();

        self.progress.report_progress(SyncProgressPayload::new(
            &connection.id,
            "syncing_cards",
        ));
        let card_stage = self.sync_cards_stage(connection, access_token, today).await?;
        report.cards_synced = card_stage.card_index.len();
        for warning in card_stage.warnings {
            report.degrade(warning);
        }

        report.duplicates_merged = self.card_service.dedupe_cards().await?;

        self.progress.report_progress(SyncProgressPayload::new(
            &connection.id,
            "syncing_transactions",
        ));
        let (accumulation, tx_warnings) = self
            .sync_transactions_stage(connection, access_token, &card_stage.card_index, today)
            .await?;
        report.transactions = accumulation;
        for warning in tx_warnings {
            report.degrade(warning);
        }

        self.progress.report_progress(SyncProgressPayload::new(
            &connection.id,
            "reconciling_cycles",
        ));
        report.cycles_reconciled = self
            .reconcile_cycles_stage(&card_stage.card_index, &card_stage.liabilities, today)
            .await?;

        Ok(report)
    }

    /// Stage: accounts + liabilities + balances -> card upserts + APRs.
    pub(crate) async fn sync_cards_stage(
        &self,
        connection: &Connection,
        access_token: &str,
        today: NaiveDate,
    ) -> Result<CardStageOutcome> {
        let mut outcome = CardStageOutcome {
            card_index: HashMap::new(),
            liabilities: LiabilitiesData::default(),
            warnings: Vec::new(),
        };

        let client = &self.client;
        let accounts: Vec<AccountData> = match self
            .retry
            .execute("get_accounts", || client.get_accounts(access_token))
            .await
        {
            Ok(accounts) => accounts,
            Err(e) if e.requires_reconnection() => return Err(e.into()),
            Err(e) => {
                warn!("Account fetch for {} degraded: {}", connection.id, e);
                outcome.warnings.push(format!("accounts unavailable: {}", e));
                return Ok(outcome);
            }
        };

        outcome.liabilities = match self
            .retry
            .execute("get_liabilities", || client.get_liabilities(access_token))
            .await
        {
            Ok(liabilities) => liabilities,
            Err(e) if e.requires_reconnection() => return Err(e.into()),
            Err(e) => {
                warn!("Liability fetch for {} degraded: {}", connection.id, e);
                outcome
                    .warnings
                    .push(format!("liabilities unavailable: {}", e));
                LiabilitiesData::default()
            }
        };

        let balances: Vec<AccountData> = match self
            .retry
            .execute("get_balances", || client.get_balances(access_token, None))
            .await
        {
            Ok(balances) => balances,
            Err(e) if e.requires_reconnection() => return Err(e.into()),
            Err(e) => {
                warn!("Balance fetch for {} degraded: {}", connection.id, e);
                outcome.warnings.push(format!("balances unavailable: {}", e));
                Vec::new()
            }
        };

        let institution_name = connection.institution_name.as_deref().unwrap_or_default();

        for account in accounts.iter().filter(|a| a.is_credit_card()) {
            let bundle =
                AccountBundle::assemble(account, &balances, &outcome.liabilities, institution_name);

            // The cascade needs what we already know about this card.
            let existing = self
                .card_repository
                .get_by_external_id(&account.account_id)?;
            let existing_card = existing.first();
            let earliest_transaction = match existing_card {
                Some(card) => self.transaction_repository.earliest_date_for_card(&card.id)?,
                None => None,
            };

            let limit = extract_credit_limit(&bundle);
            let open_date = extract_open_date(&OpenDateInputs {
                bundle: &bundle,
                existing_open_date: existing_card.and_then(|c| c.open_date),
                earliest_transaction,
                today,
            });

            let balances_block = bundle
                .balance_sources()
                .into_iter()
                .flatten()
                .find_map(|a| a.balances.as_ref());

            let update = CardSyncUpdate {
                external_account_id: account.account_id.clone(),
                name: account.display_name(),
                mask: account.mask.clone(),
                current_balance: balances_block
                    .and_then(|b| b.current)
                    .and_then(Decimal::from_f64),
                available_balance: balances_block
                    .and_then(|b| b.available)
                    .and_then(Decimal::from_f64),
                extracted_limit: limit.map(|o| o.value),
                last_statement_balance: bundle
                    .liability
                    .and_then(|l| l.last_statement_balance)
                    .and_then(Decimal::from_f64),
                last_statement_date: bundle.liability.and_then(|l| l.last_statement_issue_date),
                next_payment_due_date: bundle.liability.and_then(|l| l.next_payment_due_date),
                minimum_payment: bundle
                    .liability
                    .and_then(|l| l.minimum_payment_amount)
                    .and_then(Decimal::from_f64),
                open_date: Some(open_date.value),
            };

            let card = self
                .card_service
                .apply_sync_update(&connection.id, update)
                .await?;

            // APR snapshots are replaced wholesale each sync.
            if let Some(liability) = bundle.liability {
                let aprs: Vec<NewApr> = liability
                    .aprs
                    .iter()
                    .filter_map(|a| {
                        Some(NewApr {
                            apr_type: a.apr_type.clone()?,
                            percentage: a.apr_percentage.and_then(Decimal::from_f64)?,
                            balance_subject_to_apr: a
                                .balance_subject_to_apr
                                .and_then(Decimal::from_f64),
                        })
                    })
                    .collect();
                self.apr_repository.replace_for_card(&card.id, aprs).await?;
            }

            outcome
                .card_index
                .insert(account.account_id.clone(), card.id);
        }

        info!(
            "Card stage for connection {}: {} credit cards of {} accounts",
            connection.id,
            outcome.card_index.len(),
            accounts.len()
        );
        Ok(outcome)
    }

    /// Stage: chunked transaction fetch + accumulation.
    pub(crate) async fn sync_transactions_stage(
        &self,
        connection: &Connection,
        access_token: &str,
        card_index: &HashMap<String, String>,
        today: NaiveDate,
    ) -> Result<(cardsync_core::transactions::AccumulationReport, Vec<String>)> {
        let window_start = self.compute_window_start(connection, today);
        let policy = classify(
            connection.institution_name.as_deref().unwrap_or_default(),
            "",
        );

        let fetch = self
            .fetcher
            .fetch(access_token, window_start, today, policy)
            .await?;
        let mut warnings = fetch.warnings.clone();
        if fetch.is_partial() {
            warnings.push(format!(
                "transaction fetch partial: {}/{} chunks failed",
                fetch.chunks_failed, fetch.chunks_attempted
            ));
        }

        let report = self
            .accumulator
            .accumulate(
                &connection.id,
                card_index,
                fetch.transactions,
                fetch.window_start,
            )
            .await?;

        Ok((report, warnings))
    }

    /// Stage: rebuild and reconcile billing cycles per card.
    pub(crate) async fn reconcile_cycles_stage(
        &self,
        card_index: &HashMap<String, String>,
        liabilities: &LiabilitiesData,
        today: NaiveDate,
    ) -> Result<usize> {
        let mut total = 0;

        for (external_id, card_id) in card_index {
            let card = self.card_repository.get_by_id(card_id)?;
            let transactions = self.transaction_repository.list_by_card(card_id)?;
            let liability = liabilities
                .credit
                .iter()
                .find(|l| l.account_id.as_deref() == Some(external_id.as_str()));

            // Three sources of cycle records for the same card; the
            // reconciler collapses the overlap preferring richness.
            let mut candidates = self.cycle_repository.list_by_card(card_id)?;
            candidates.extend(build_recent_cycles(&card, liability, &transactions, today));
            candidates.extend(build_history_cycles(&card, &transactions, today));

            let reconciled = reconcile_cycles(candidates);
            total += self
                .cycle_repository
                .replace_for_card(card_id, reconciled)
                .await?;
        }

        Ok(total)
    }

    /// Stage (reconnection flow): estimate open dates for cards missing one.
    pub(crate) async fn backfill_missing_open_dates(&self, connection_id: &str) -> Result<usize> {
        let today = chrono::Utc::now().date_naive();
        let mut backfilled = 0;

        for mut card in self.card_repository.list_by_connection(connection_id)? {
            if card.open_date.is_some() {
                continue;
            }

            let estimated = match self.transaction_repository.earliest_date_for_card(&card.id)? {
                Some(earliest) => earliest
                    .checked_sub_days(Days::new(
                        cardsync_core::constants::OPEN_DATE_TRANSACTION_MARGIN_DAYS as u64,
                    ))
                    .unwrap_or(earliest),
                None => today
                    .checked_sub_months(Months::new(
                        cardsync_core::constants::OPEN_DATE_DEFAULT_LOOKBACK_MONTHS,
                    ))
                    .unwrap_or(today),
            };

            info!(
                "Backfilling open date for card {} to {}",
                card.id, estimated
            );
            card.open_date = Some(estimated);
            self.card_repository.update(card).await?;
            backfilled += 1;
        }

        Ok(backfilled)
    }

    /// Incremental window start: a week before the last successful sync,
    /// else the full default lookback.
    fn compute_window_start(&self, connection: &Connection, today: NaiveDate) -> NaiveDate {
        connection
            .last_synced_at
            .map(|dt| dt.date_naive())
            .and_then(|d| d.checked_sub_days(Days::new(SYNC_OVERLAP_DAYS as u64)))
            .unwrap_or_else(|| {
                today
                    .checked_sub_months(Months::new(DEFAULT_LOOKBACK_MONTHS))
                    .unwrap_or(today)
            })
            .min(today)
    }

    pub(crate) fn connection_service(&self) -> &Arc<dyn ConnectionServiceTrait> {
        &self.connection_service
    }

    pub(crate) fn card_repository(&self) -> &Arc<dyn CardRepositoryTrait> {
        &self.card_repository
    }

    pub(crate) fn transaction_repository(&self) -> &Arc<dyn TransactionRepositoryTrait> {
        &self.transaction_repository
    }

    pub(crate) fn client(&self) -> &Arc<dyn AggregatorClient> {
        &self.client
    }

    pub(crate) fn lease_repository(&self) -> &Arc<dyn SyncLeaseRepositoryTrait> {
        &self.lease_repository
    }

    pub(crate) fn retry(&self) -> &RetryExecutor {
        &self.retry
    }
}

/// True when the error means the credential is dead and the user must relink.
fn is_reconnect_error(err: &Error) -> bool {
    match err {
        Error::Aggregator(e) => e.requires_reconnection(),
        Error::RequiresReconnection { .. } => true,
        _ => false,
    }
}
