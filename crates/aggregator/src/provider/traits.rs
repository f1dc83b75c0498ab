//! Trait defining the aggregator API surface the sync engine consumes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::AggregatorError;
use crate::models::{
    AccountData, Institution, LiabilitiesData, LinkToken, TokenExchange, TransactionData,
};

/// Method-level contract for the bank-data aggregator.
///
/// All calls accept/return institution-specific shapes; the sync engine
/// treats every field as best-effort. Implementations must not retry
/// internally — retrying is the retry executor's job.
#[async_trait]
pub trait AggregatorClient: Send + Sync {
    /// Exchange a public (link) token for a durable access credential.
    async fn exchange_token(&self, public_token: &str) -> Result<TokenExchange, AggregatorError>;

    /// Look up the institution behind an item.
    async fn get_institution(&self, item_id: &str) -> Result<Institution, AggregatorError>;

    /// Fetch all accounts under a credential.
    async fn get_accounts(&self, access_token: &str) -> Result<Vec<AccountData>, AggregatorError>;

    /// Fetch liabilities (credit records) under a credential.
    async fn get_liabilities(
        &self,
        access_token: &str,
    ) -> Result<LiabilitiesData, AggregatorError>;

    /// Fetch fresh balances. `min_last_updated` asks the aggregator to
    /// refresh balances older than the given instant before responding.
    async fn get_balances(
        &self,
        access_token: &str,
        min_last_updated: Option<DateTime<Utc>>,
    ) -> Result<Vec<AccountData>, AggregatorError>;

    /// Fetch transactions in `[start_date, end_date]` (inclusive).
    async fn get_transactions(
        &self,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TransactionData>, AggregatorError>;

    /// Create a link token for the initial consent flow.
    async fn create_link_token(&self, user_id: &str) -> Result<LinkToken, AggregatorError>;

    /// Create a link token in update mode, for refreshing an existing item's
    /// credential.
    async fn create_update_link_token(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> Result<LinkToken, AggregatorError>;

    /// Remove an item (revoke the credential) on the aggregator side.
    async fn remove_item(&self, access_token: &str) -> Result<(), AggregatorError>;
}
