//! Reconnection validation.
//!
//! After a credential refresh the connection's data may be in any state, so
//! the validator forces a fresh full sync in independent stages and then
//! checks for minimum viable data completeness. A stage failure is recorded
//! and later stages still run against whatever earlier stages produced; only
//! the terminal validation decides success.

use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use cardsync_core::connections::Connection;
use cardsync_core::errors::{Error, Result};

use super::service::CardSyncService;

/// Stages of the reconnection flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconnectStage {
    TokenRefreshed,
    ValidatingToken,
    SyncingAccounts,
    SyncingTransactions,
    BackfillingMissingOpenDates,
    Validating,
}

impl ReconnectStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::ValidatingToken => "VALIDATING_TOKEN",
            Self::SyncingAccounts => "SYNCING_ACCOUNTS",
            Self::SyncingTransactions => "SYNCING_TRANSACTIONS",
            Self::BackfillingMissingOpenDates => "BACKFILLING_MISSING_OPEN_DATES",
            Self::Validating => "VALIDATING",
        }
    }
}

/// One stage's result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResult {
    pub stage: ReconnectStage,
    pub ok: bool,
    pub error: Option<String>,
}

/// The full reconnection outcome.
///
/// `succeeded` reflects the terminal validation only: stages may have
/// written data even when the reconnection as a whole is reported failed,
/// so callers must not assume a failed reconnection changed nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectionReport {
    pub connection_id: String,
    pub stages: Vec<StageResult>,
    pub succeeded: bool,
    pub cards: usize,
    pub cards_with_open_date: usize,
    pub cards_with_data: usize,
}

/// Drives the staged post-relink flow.
pub struct ReconnectionValidator {
    service: Arc<CardSyncService>,
}

impl ReconnectionValidator {
    pub fn new(service: Arc<CardSyncService>) -> Self {
        Self { service }
    }

    /// Run the reconnection flow for a connection whose credential was just
    /// refreshed to `new_access_token`.
    pub async fn run(
        &self,
        connection: &Connection,
        new_access_token: &str,
    ) -> Result<ReconnectionReport> {
        let holder = format!("reconnect-{}", uuid::Uuid::new_v4());
        if self
            .service
            .lease_repository()
            .try_acquire(&connection.id, &holder)
            .await?
            .is_none()
        {
            return Err(Error::LeaseHeld(connection.id.clone()));
        }

        let report = self.run_stages(connection, new_access_token).await;

        if let Err(e) = self
            .service
            .lease_repository()
            .release(&connection.id, &holder)
            .await
        {
            warn!("Failed to release reconnect lease for {}: {}", connection.id, e);
        }

        report
    }

    async fn run_stages(
        &self,
        connection: &Connection,
        new_access_token: &str,
    ) -> Result<ReconnectionReport> {
        let mut stages: Vec<StageResult> = Vec::new();
        let today = chrono::Utc::now().date_naive();

        // A reconnection always re-fetches the full window: pretend this
        // connection has never synced.
        let mut fresh = connection.clone();
        fresh.last_synced_at = None;

        // Stage: persist the refreshed credential.
        record(
            &mut stages,
            ReconnectStage::TokenRefreshed,
            self.service
                .connection_service()
                .replace_credential(&connection.id, new_access_token)
                .await
                .map_err(|e| e.to_string()),
        );

        // Stage: probe that the credential actually works.
        let client = self.service.client().clone();
        let probe = self
            .service
            .retry()
            .execute("get_accounts", || client.get_accounts(new_access_token))
            .await;
        record(
            &mut stages,
            ReconnectStage::ValidatingToken,
            probe.as_ref().map(|_| ()).map_err(|e| e.to_string()),
        );

        // Stage: accounts, liabilities, balances -> cards.
        let card_stage = self
            .service
            .sync_cards_stage(&fresh, new_access_token, today)
            .await;
        let card_index = match &card_stage {
            Ok(outcome) => outcome.card_index.clone(),
            Err(_) => Default::default(),
        };
        record(
            &mut stages,
            ReconnectStage::SyncingAccounts,
            card_stage.as_ref().map(|_| ()).map_err(|e| e.to_string()),
        );

        // Stage: transactions, against whatever cards exist.
        let tx_stage = self
            .service
            .sync_transactions_stage(&fresh, new_access_token, &card_index, today)
            .await;
        record(
            &mut stages,
            ReconnectStage::SyncingTransactions,
            tx_stage.as_ref().map(|_| ()).map_err(|e| e.to_string()),
        );

        // Stage: estimate open dates the sync left empty.
        let backfill = self.service.backfill_missing_open_dates(&connection.id).await;
        record(
            &mut stages,
            ReconnectStage::BackfillingMissingOpenDates,
            backfill.as_ref().map(|_| ()).map_err(|e| e.to_string()),
        );

        // Terminal stage: minimum viable data, regardless of what the
        // individual stages reported.
        let validation = self.validate_minimum_data(&connection.id);
        let (succeeded, cards, with_open_date, with_data) = match &validation {
            Ok(counts) => (counts.ok(), counts.cards, counts.with_open_date, counts.with_data),
            Err(_) => (false, 0, 0, 0),
        };
        record(
            &mut stages,
            ReconnectStage::Validating,
            validation
                .map_err(|e| e.to_string())
                .and_then(|c| if c.ok() { Ok(()) } else { Err(c.describe()) }),
        );

        if succeeded {
            self.service
                .connection_service()
                .record_sync_success(&connection.id)
                .await?;
            info!("Reconnection for {} validated successfully", connection.id);
        } else {
            warn!(
                "Reconnection for {} failed validation ({} cards, {} with open date, {} with data)",
                connection.id, cards, with_open_date, with_data
            );
        }

        Ok(ReconnectionReport {
            connection_id: connection.id.clone(),
            stages,
            succeeded,
            cards,
            cards_with_open_date: with_open_date,
            cards_with_data: with_data,
        })
    }

    fn validate_minimum_data(&self, connection_id: &str) -> Result<ValidationCounts> {
        let cards = self.service.card_repository().list_by_connection(connection_id)?;

        let mut counts = ValidationCounts {
            cards: cards.len(),
            with_open_date: 0,
            with_data: 0,
        };

        for card in &cards {
            if card.open_date.is_some() {
                counts.with_open_date += 1;
            }
            let has_balance = card.current_balance.is_some() || card.available_balance.is_some();
            let has_transactions = self
                .service
                .transaction_repository()
                .count_for_card(&card.id)?
                > 0;
            if has_balance || has_transactions {
                counts.with_data += 1;
            }
        }

        Ok(counts)
    }
}

struct ValidationCounts {
    cards: usize,
    with_open_date: usize,
    with_data: usize,
}

impl ValidationCounts {
    /// At least one card, at least one with an open date, and at least one
    /// with a balance or a stored transaction.
    fn ok(&self) -> bool {
        self.cards > 0 && self.with_open_date > 0 && self.with_data > 0
    }

    fn describe(&self) -> String {
        format!(
            "incomplete data: {} cards, {} with open date, {} with balance or transactions",
            self.cards, self.with_open_date, self.with_data
        )
    }
}

fn record(
    stages: &mut Vec<StageResult>,
    stage: ReconnectStage,
    result: std::result::Result<(), String>,
) {
    match result {
        Ok(()) => {
            info!("Reconnect stage {} completed", stage.as_str());
            stages.push(StageResult {
                stage,
                ok: true,
                error: None,
            });
        }
        Err(error) => {
            warn!("Reconnect stage {} failed: {}", stage.as_str(), error);
            stages.push(StageResult {
                stage,
                ok: false,
                error: Some(error),
            });
        }
    }
}
