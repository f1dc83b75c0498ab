//! The sync engine: fetcher, per-connection service, reconnection flow.

mod cycles;
mod fetcher;
mod progress;
mod reconnect;
mod service;


pub use fetcher::{ChunkedTransactionFetcher, FetchConfig, FetchOutcome, FetchState};
pub use progress::{NoOpProgressReporter, SyncProgressPayload, SyncProgressReporter};
pub use reconnect::{ReconnectStage, ReconnectionReport, ReconnectionValidator, StageResult};
pub use service::CardSyncService;
