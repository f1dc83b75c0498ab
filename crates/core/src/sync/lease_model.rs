//! Per-connection sync leases.
//!
//! A sync may only run while holding its connection's lease. This replaces
//! ad hoc "sync in progress" flags: the lease is a row with an expiry, so a
//! crashed sync cannot wedge its connection — the lease simply times out and
//! the next sync reclaims it.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::SYNC_LEASE_TTL_MINUTES;
use crate::errors::Result;

/// A held sync lease for one connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLease {
    /// The connection the lease covers (one lease per connection)
    pub connection_id: String,
    /// Opaque token identifying the holder
    pub holder: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SyncLease {
    pub fn new(connection_id: String, holder: String) -> Self {
        let now = Utc::now();
        Self {
            connection_id,
            holder,
            acquired_at: now,
            expires_at: now + Duration::minutes(SYNC_LEASE_TTL_MINUTES),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Repository contract for sync leases.
#[async_trait]
pub trait SyncLeaseRepositoryTrait: Send + Sync {
    /// Acquire the lease for a connection. Returns `None` when another
    /// holder has a live lease; an expired lease is reclaimed.
    async fn try_acquire(&self, connection_id: &str, holder: &str) -> Result<Option<SyncLease>>;

    /// Release a held lease. Releasing a lease held by someone else is a
    /// no-op (the holder token must match).
    async fn release(&self, connection_id: &str, holder: &str) -> Result<()>;

    fn get(&self, connection_id: &str) -> Result<Option<SyncLease>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lease_is_not_expired() {
        let lease = SyncLease::new("conn-1".to_string(), "holder-1".to_string());
        assert!(!lease.is_expired(Utc::now()));
    }

    #[test]
    fn test_lease_expires_after_ttl() {
        let lease = SyncLease::new("conn-1".to_string(), "holder-1".to_string());
        let later = Utc::now() + Duration::minutes(SYNC_LEASE_TTL_MINUTES + 1);
        assert!(lease.is_expired(later));
    }
}
