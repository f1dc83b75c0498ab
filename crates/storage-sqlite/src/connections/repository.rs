use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::connections;
use crate::schema::connections::dsl::*;
use crate::utils::datetime_to_db;

use super::model::ConnectionDB;
use cardsync_core::connections::{Connection, ConnectionRepositoryTrait, ConnectionStatus, NewConnection};
use cardsync_core::errors::Result;

/// Repository for managing connection rows.
pub struct ConnectionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ConnectionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ConnectionRepositoryTrait for ConnectionRepository {
    fn get_by_id(&self, connection_id: &str) -> Result<Connection> {
        let mut conn = get_connection(&self.pool)?;

        let row = connections
            .select(ConnectionDB::as_select())
            .find(connection_id)
            .first::<ConnectionDB>(&mut conn)
            .into_core()?;

        Ok(row.into())
    }

    fn get_by_item_id(&self, item: &str) -> Result<Option<Connection>> {
        let mut conn = get_connection(&self.pool)?;

        let row = connections
            .select(ConnectionDB::as_select())
            .filter(item_id.eq(item))
            .first::<ConnectionDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(row.map(Connection::from))
    }

    fn list(&self) -> Result<Vec<Connection>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = connections
            .select(ConnectionDB::as_select())
            .order(created_at.asc())
            .load::<ConnectionDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(Connection::from).collect())
    }

    async fn create(&self, new_connection: NewConnection) -> Result<Connection> {
        new_connection.validate()?;
        let row: ConnectionDB = new_connection.into();

        self.writer
            .exec(move |conn| {
                diesel::insert_into(connections::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(row.into())
            })
            .await
    }

    async fn update_access_token(&self, connection_id: &str, token: &str) -> Result<()> {
        let connection_id = connection_id.to_string();
        let token = token.to_string();

        self.writer
            .exec(move |conn| {
                diesel::update(connections.find(&connection_id))
                    .set((
                        access_token.eq(&token),
                        updated_at.eq(datetime_to_db(Utc::now())),
                    ))
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn set_status(
        &self,
        connection_id: &str,
        new_status: ConnectionStatus,
        error_code: Option<String>,
        error_message: Option<String>,
    ) -> Result<()> {
        let connection_id = connection_id.to_string();

        self.writer
            .exec(move |conn| {
                diesel::update(connections.find(&connection_id))
                    .set((
                        status.eq(new_status.as_str()),
                        last_error_code.eq(error_code),
                        last_error_message.eq(error_message),
                        updated_at.eq(datetime_to_db(Utc::now())),
                    ))
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn mark_synced(&self, connection_id: &str, at: DateTime<Utc>) -> Result<()> {
        let connection_id = connection_id.to_string();

        self.writer
            .exec(move |conn| {
                diesel::update(connections.find(&connection_id))
                    .set((
                        last_synced_at.eq(datetime_to_db(at)),
                        updated_at.eq(datetime_to_db(Utc::now())),
                    ))
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }
}
