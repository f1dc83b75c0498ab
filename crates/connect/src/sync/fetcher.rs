//! Chunked, institution-aware transaction fetching.
//!
//! Restricted-history institutions cap the whole window, so they get one
//! clamped call. Standard institutions get fixed-size date chunks fetched
//! sequentially with a small delay, bounding per-call payloads and
//! rate-limit exposure. A failing chunk shrinks the result; it never aborts
//! the fetch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use log::{debug, info, warn};

use cardsync_aggregator::models::TransactionData;
use cardsync_aggregator::{AggregatorClient, AggregatorError, RetryExecutor};
use cardsync_core::constants::{INTER_CHUNK_DELAY_MS, MAX_RESTRICTED_HISTORY_DAYS};
use cardsync_core::institutions::InstitutionPolicy;

/// Fetcher knobs.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Pause between sequential chunk fetches.
    pub inter_chunk_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            inter_chunk_delay: Duration::from_millis(INTER_CHUNK_DELAY_MS),
        }
    }
}

/// Fetch progress. There is no abort transition: chunk failures only move
/// the terminal state from `Done` to `PartialFailure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    NotStarted,
    Fetching { chunk: usize, of: usize },
    Done,
    PartialFailure,
}

/// What a fetch produced.
#[derive(Debug)]
pub struct FetchOutcome {
    pub transactions: Vec<TransactionData>,
    pub state: FetchState,
    /// Effective (possibly clamped) window that was fetched
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub chunks_attempted: usize,
    pub chunks_failed: usize,
    /// Non-fatal anomalies (failed chunks, suspicious spans)
    pub warnings: Vec<String>,
}

impl FetchOutcome {
    pub fn is_partial(&self) -> bool {
        self.state == FetchState::PartialFailure
    }
}

/// Issues date-bounded transaction fetches sized per institution class.
pub struct ChunkedTransactionFetcher {
    client: Arc<dyn AggregatorClient>,
    retry: RetryExecutor,
    config: FetchConfig,
}

impl ChunkedTransactionFetcher {
    pub fn new(client: Arc<dyn AggregatorClient>, retry: RetryExecutor) -> Self {
        Self {
            client,
            retry,
            config: FetchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Fetch transactions for `[requested_start, end]` under the
    /// institution's policy.
    ///
    /// Only a credential error propagates as `Err` (the caller must route
    /// into the reconnection flow). Everything else degrades: failed chunks
    /// are logged and the outcome carries whatever was accumulated.
    pub async fn fetch(
        &self,
        access_token: &str,
        requested_start: NaiveDate,
        end: NaiveDate,
        policy: &InstitutionPolicy,
    ) -> Result<FetchOutcome, AggregatorError> {
        if policy.restricted_history {
            self.fetch_restricted(access_token, requested_start, end)
                .await
        } else {
            self.fetch_chunked(access_token, requested_start, end, policy.chunk_days)
                .await
        }
    }

    /// Restricted institutions cap the whole window, so chunking buys
    /// nothing: clamp and fetch once.
    async fn fetch_restricted(
        &self,
        access_token: &str,
        requested_start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchOutcome, AggregatorError> {
        let cap = end
            .checked_sub_days(Days::new(MAX_RESTRICTED_HISTORY_DAYS as u64))
            .unwrap_or(end);
        let start = requested_start.max(cap);
        if start > requested_start {
            debug!(
                "Restricted-history institution: clamping fetch start {} -> {}",
                requested_start, start
            );
        }

        let mut outcome = FetchOutcome {
            transactions: Vec::new(),
            state: FetchState::Fetching { chunk: 1, of: 1 },
            window_start: start,
            window_end: end,
            chunks_attempted: 1,
            chunks_failed: 0,
            warnings: Vec::new(),
        };

        match self.fetch_window(access_token, start, end).await {
            Ok(transactions) => {
                outcome.transactions = transactions;
                outcome.state = FetchState::Done;
            }
            Err(e) if e.requires_reconnection() => return Err(e),
            Err(e) => {
                warn!("Restricted fetch {} -> {} failed: {}", start, end, e);
                outcome.chunks_failed = 1;
                outcome.state = FetchState::PartialFailure;
                outcome.warnings.push(format!("fetch failed: {}", e));
            }
        }

        self.validate_restricted_span(&mut outcome);
        Ok(outcome)
    }

    /// Standard institutions: sequential fixed-size chunks, oldest first.
    async fn fetch_chunked(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
        chunk_days: i64,
    ) -> Result<FetchOutcome, AggregatorError> {
        let chunks = build_chunks(start, end, chunk_days);
        let total = chunks.len();
        info!(
            "Fetching transactions {} -> {} in {} chunks of {} days",
            start, end, total, chunk_days
        );

        let mut outcome = FetchOutcome {
            transactions: Vec::new(),
            state: FetchState::NotStarted,
            window_start: start,
            window_end: end,
            chunks_attempted: 0,
            chunks_failed: 0,
            warnings: Vec::new(),
        };

        for (i, (chunk_start, chunk_end)) in chunks.iter().enumerate() {
            outcome.state = FetchState::Fetching {
                chunk: i + 1,
                of: total,
            };
            outcome.chunks_attempted += 1;
            debug!(
                "Fetching chunk {}/{}: {} -> {}",
                i + 1,
                total,
                chunk_start,
                chunk_end
            );

            match self
                .fetch_window(access_token, *chunk_start, *chunk_end)
                .await
            {
                Ok(mut transactions) => {
                    outcome.transactions.append(&mut transactions);
                }
                Err(e) if e.requires_reconnection() => return Err(e),
                Err(e) => {
                    // Partial data beats none: stop here and return what we
                    // have rather than failing the sync.
                    warn!(
                        "Chunk {}/{} ({} -> {}) failed, keeping {} transactions fetched so far: {}",
                        i + 1,
                        total,
                        chunk_start,
                        chunk_end,
                        outcome.transactions.len(),
                        e
                    );
                    outcome.chunks_failed += 1;
                    outcome.state = FetchState::PartialFailure;
                    outcome
                        .warnings
                        .push(format!("chunk {}/{} failed: {}", i + 1, total, e));
                    return Ok(outcome);
                }
            }

            if i + 1 < total && !self.config.inter_chunk_delay.is_zero() {
                tokio::time::sleep(self.config.inter_chunk_delay).await;
            }
        }

        outcome.state = FetchState::Done;
        Ok(outcome)
    }

    async fn fetch_window(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TransactionData>, AggregatorError> {
        let client = &self.client;
        self.retry
            .execute("get_transactions", || {
                client.get_transactions(access_token, start, end)
            })
            .await
    }

    /// A restricted institution that returns far less than its clamped
    /// window deserves a warning; it usually means the integration quietly
    /// shrank its history again.
    fn validate_restricted_span(&self, outcome: &mut FetchOutcome) {
        if outcome.transactions.is_empty() {
            return;
        }
        let dates: Vec<NaiveDate> = outcome.transactions.iter().filter_map(|t| t.date).collect();
        let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
            return;
        };

        let actual_span = (*max - *min).num_days();
        let expected_span = (outcome.window_end - outcome.window_start).num_days();
        if expected_span > 0 && actual_span < expected_span / 2 {
            let warning = format!(
                "restricted institution covered only {} of {} expected days",
                actual_span, expected_span
            );
            warn!("{}", warning);
            outcome.warnings.push(warning);
        }
    }
}

/// Split `[start, end]` into consecutive inclusive windows of `chunk_days`.
fn build_chunks(start: NaiveDate, end: NaiveDate, chunk_days: i64) -> Vec<(NaiveDate, NaiveDate)> {
    let mut chunks = Vec::new();
    if start > end {
        return chunks;
    }
    let step = chunk_days.max(1) as u64;

    let mut cursor = start;
    while cursor <= end {
        let chunk_end = cursor
            .checked_add_days(Days::new(step - 1))
            .unwrap_or(end)
            .min(end);
        chunks.push((cursor, chunk_end));
        match chunk_end.checked_add_days(Days::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    chunks
}
