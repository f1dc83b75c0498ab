use log::info;
use std::sync::Arc;

use super::connections_model::{Connection, ConnectionStatus, NewConnection};
use super::connections_traits::{ConnectionRepositoryTrait, ConnectionServiceTrait};
use crate::errors::Result;

/// Service for managing connection lifecycle state.
pub struct ConnectionService {
    repository: Arc<dyn ConnectionRepositoryTrait>,
}

impl ConnectionService {
    pub fn new(repository: Arc<dyn ConnectionRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl ConnectionServiceTrait for ConnectionService {
    async fn register(&self, new_connection: NewConnection) -> Result<Connection> {
        new_connection.validate()?;

        // Re-linking an already known item refreshes its credential instead
        // of creating a second connection.
        if let Some(existing) = self.repository.get_by_item_id(&new_connection.item_id)? {
            info!(
                "Item {} already linked as connection {}, refreshing credential",
                new_connection.item_id, existing.id
            );
            self.repository
                .update_access_token(&existing.id, &new_connection.access_token)
                .await?;
            self.repository
                .set_status(&existing.id, ConnectionStatus::Active, None, None)
                .await?;
            return self.repository.get_by_id(&existing.id);
        }

        let connection = self.repository.create(new_connection).await?;
        info!(
            "Registered connection {} for institution {:?}",
            connection.id, connection.institution_name
        );
        Ok(connection)
    }

    fn get_connection(&self, connection_id: &str) -> Result<Connection> {
        self.repository.get_by_id(connection_id)
    }

    fn list_connections(&self) -> Result<Vec<Connection>> {
        self.repository.list()
    }

    async fn record_sync_success(&self, connection_id: &str) -> Result<()> {
        self.repository
            .set_status(connection_id, ConnectionStatus::Active, None, None)
            .await?;
        self.repository
            .mark_synced(connection_id, chrono::Utc::now())
            .await
    }

    async fn record_sync_failure(
        &self,
        connection_id: &str,
        error_code: &str,
        error_message: &str,
        expired: bool,
    ) -> Result<()> {
        let status = if expired {
            ConnectionStatus::Expired
        } else {
            ConnectionStatus::Error
        };
        self.repository
            .set_status(
                connection_id,
                status,
                Some(error_code.to_string()),
                Some(error_message.to_string()),
            )
            .await
    }

    async fn replace_credential(&self, connection_id: &str, access_token: &str) -> Result<()> {
        self.repository
            .update_access_token(connection_id, access_token)
            .await?;
        self.repository
            .set_status(connection_id, ConnectionStatus::Active, None, None)
            .await
    }
}
