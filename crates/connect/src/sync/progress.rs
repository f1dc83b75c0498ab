//! Progress reporting for sync operations.
//!
//! The sync engine reports stage-level progress through a pluggable trait so
//! callers (a scheduler, an SSE stream, a desktop shell) can surface it
//! however they like.

use serde::{Deserialize, Serialize};

use cardsync_core::sync::SyncReport;

/// Payload for sync progress events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgressPayload {
    /// The connection being synced
    pub connection_id: String,
    /// Stage label (e.g. "syncing_cards", "fetching chunk 2/4")
    pub stage: String,
    /// Transactions fetched so far
    pub transactions_fetched: usize,
    /// Optional status message
    pub message: Option<String>,
}

impl SyncProgressPayload {
    pub fn new(connection_id: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            stage: stage.into(),
            transactions_fetched: 0,
            message: None,
        }
    }

    pub fn with_transactions_fetched(mut self, count: usize) -> Self {
        self.transactions_fetched = count;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Trait for reporting sync progress.
pub trait SyncProgressReporter: Send + Sync {
    /// Report progress for one connection sync.
    fn report_progress(&self, payload: SyncProgressPayload);

    /// Report that a sync completed (successfully or not).
    fn report_sync_complete(&self, report: &SyncReport);
}

/// A no-op reporter for contexts where progress reporting is not needed.
#[derive(Debug, Clone, Default)]
pub struct NoOpProgressReporter;

impl SyncProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _payload: SyncProgressPayload) {
        // No-op
    }

    fn report_sync_complete(&self, _report: &SyncReport) {
        // No-op
    }
}
