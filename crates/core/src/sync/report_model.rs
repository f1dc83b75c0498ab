//! Sync outcome and report models.

use serde::{Deserialize, Serialize};

use crate::transactions::AccumulationReport;

/// Per-connection outcome of a sync attempt.
///
/// `Degraded` means the sync completed with partial data (a failed chunk or
/// exhausted rate-limit retries); callers can retry later without user
/// involvement. `NeedsReconnection` means the credential is dead and only
/// the user can fix it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncOutcome {
    #[default]
    Success,
    Degraded,
    NeedsReconnection,
    Failed,
}

/// What one sync of one connection did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub connection_id: String,
    pub outcome: SyncOutcome,
    pub cards_synced: usize,
    pub duplicates_merged: usize,
    pub transactions: AccumulationReport,
    pub cycles_reconciled: usize,
    /// Non-fatal anomalies worth surfacing (short spans, skipped chunks)
    #[serde(default)]
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl SyncReport {
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            ..Default::default()
        }
    }

    pub fn degrade(&mut self, warning: impl Into<String>) {
        if self.outcome == SyncOutcome::Success {
            self.outcome = SyncOutcome::Degraded;
        }
        self.warnings.push(warning.into());
    }
}
