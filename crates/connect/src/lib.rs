//! Cardsync Connect - the per-connection sync engine.
//!
//! Ties the aggregator client, the domain services in `cardsync-core`, and
//! the SQLite repositories together:
//! - [`sync::ChunkedTransactionFetcher`]: institution-aware, date-chunked
//!   transaction fetching with partial-failure semantics
//! - [`sync::CardSyncService`]: the full per-connection sync (cards, APRs,
//!   transactions, billing cycles) under a sync lease
//! - [`sync::ReconnectionValidator`]: the staged post-relink flow with a
//!   terminal completeness check

pub mod sync;

pub use sync::{
    CardSyncService, ChunkedTransactionFetcher, FetchConfig, FetchOutcome, FetchState,
    NoOpProgressReporter, ReconnectionReport, ReconnectionValidator, ReconnectStage,
    SyncProgressPayload, SyncProgressReporter,
};
