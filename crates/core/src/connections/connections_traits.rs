//! Traits for connection persistence and services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::connections_model::{Connection, ConnectionStatus, NewConnection};
use crate::errors::Result;

/// Repository contract for connections.
#[async_trait]
pub trait ConnectionRepositoryTrait: Send + Sync {
    fn get_by_id(&self, connection_id: &str) -> Result<Connection>;
    fn get_by_item_id(&self, item_id: &str) -> Result<Option<Connection>>;
    fn list(&self) -> Result<Vec<Connection>>;
    async fn create(&self, new_connection: NewConnection) -> Result<Connection>;
    /// Replace the stored access token after a credential refresh.
    async fn update_access_token(&self, connection_id: &str, access_token: &str) -> Result<()>;
    async fn set_status(
        &self,
        connection_id: &str,
        status: ConnectionStatus,
        error_code: Option<String>,
        error_message: Option<String>,
    ) -> Result<()>;
    async fn mark_synced(&self, connection_id: &str, at: DateTime<Utc>) -> Result<()>;
}

/// Service contract for connection lifecycle bookkeeping.
#[async_trait]
pub trait ConnectionServiceTrait: Send + Sync {
    /// Create a connection from a successful credential exchange.
    async fn register(&self, new_connection: NewConnection) -> Result<Connection>;

    fn get_connection(&self, connection_id: &str) -> Result<Connection>;
    fn list_connections(&self) -> Result<Vec<Connection>>;

    /// Record a successful sync: status back to active, errors cleared.
    async fn record_sync_success(&self, connection_id: &str) -> Result<()>;

    /// Record a failed sync. `expired` marks the credential itself as dead,
    /// which routes the caller into the reconnection flow.
    async fn record_sync_failure(
        &self,
        connection_id: &str,
        error_code: &str,
        error_message: &str,
        expired: bool,
    ) -> Result<()>;

    /// Store a refreshed access token and reset status to active.
    async fn replace_credential(&self, connection_id: &str, access_token: &str) -> Result<()>;
}
