//! Connection domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, Error, Result};

/// Lifecycle status of a linked institution credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    /// Credential works; syncs are expected to succeed
    #[default]
    Active,
    /// Last sync failed for a reason other than the credential
    Error,
    /// Credential is invalid; the user must relink
    Expired,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Error => "ERROR",
            Self::Expired => "EXPIRED",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "ERROR" => Self::Error,
            "EXPIRED" => Self::Expired,
            _ => Self::Active,
        }
    }
}

/// One linked institution credential.
///
/// The access token is stored as opaque text; encryption and decryption
/// happen outside this core. Connections are never deleted by a sync —
/// removal is an explicit user action elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    /// Aggregator-side item identifier
    pub item_id: String,
    /// Opaque encrypted access credential
    pub access_token: String,
    pub institution_id: Option<String>,
    pub institution_name: Option<String>,
    pub status: ConnectionStatus,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_error_code: Option<String>,
    pub last_error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input model for creating a connection after a successful token exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConnection {
    pub item_id: String,
    pub access_token: String,
    pub institution_id: Option<String>,
    pub institution_name: Option<String>,
}

impl NewConnection {
    pub fn validate(&self) -> Result<()> {
        if self.item_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "item_id".to_string(),
            )));
        }
        if self.access_token.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "access_token".to_string(),
            )));
        }
        Ok(())
    }
}
