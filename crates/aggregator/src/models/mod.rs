//! Models for aggregator API payloads.
//!
//! Field names vary per institution and API version, so nearly everything is
//! optional and several fields carry serde aliases. Mapping to the local
//! domain model (and all best-effort field extraction) happens in
//! `cardsync-core`; these types stay close to the wire.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize an amount that may arrive as a number, a numeric string, a
/// sentinel string ("N/A", "Unknown", ""), or null. Sentinels and anything
/// unparseable become `None` instead of failing the whole response.
fn flexible_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null,
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Result of exchanging a public (link) token for a durable credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenExchange {
    /// The durable access credential for the item
    pub access_token: String,
    /// The aggregator-side item identifier
    pub item_id: String,
}

/// A link token used to drive the aggregator's consent UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkToken {
    pub link_token: String,
    /// RFC 3339 expiration timestamp, when provided
    pub expiration: Option<String>,
}

/// An institution as reported by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Institution {
    pub institution_id: Option<String>,
    pub name: Option<String>,
}

/// Balance block attached to accounts (and, at some institutions, to
/// liability records).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccountBalances {
    /// Amount available to spend
    #[serde(default, deserialize_with = "flexible_amount")]
    pub available: Option<f64>,
    /// Current balance owed
    #[serde(default, deserialize_with = "flexible_amount")]
    pub current: Option<f64>,
    /// Credit limit, when the institution reports one here
    #[serde(default, alias = "credit_limit", deserialize_with = "flexible_amount")]
    pub limit: Option<f64>,
    pub iso_currency_code: Option<String>,
    /// When the balance was last refreshed (RFC 3339)
    pub last_updated_datetime: Option<String>,
}

/// An account record from the accounts or balances endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccountData {
    pub account_id: String,
    pub name: Option<String>,
    pub official_name: Option<String>,
    /// Last 2-4 digits of the account number
    pub mask: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    /// e.g. "credit card", "checking"
    pub subtype: Option<String>,
    pub balances: Option<AccountBalances>,
    /// Account-level origination date, reported by a handful of institutions
    #[serde(alias = "opened_date")]
    pub origination_date: Option<NaiveDate>,
}

impl AccountData {
    /// True when the aggregator classifies this account as a credit card.
    pub fn is_credit_card(&self) -> bool {
        self.subtype
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("credit card"))
            .unwrap_or(false)
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.official_name.clone())
            .unwrap_or_else(|| format!("Card •{}", self.mask.as_deref().unwrap_or("????")))
    }
}

/// One APR entry on a credit liability.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AprData {
    /// e.g. "purchase_apr", "balance_transfer_apr", "cash_advance_apr"
    pub apr_type: Option<String>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub apr_percentage: Option<f64>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub balance_subject_to_apr: Option<f64>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub interest_charge_amount: Option<f64>,
}

/// A credit-card liability record.
///
/// The limit fields are deliberately redundant: institutions disagree about
/// where the credit limit lives, and the extraction cascade in
/// `cardsync-core` tries them in a fixed priority order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreditLiability {
    pub account_id: Option<String>,
    #[serde(default)]
    pub aprs: Vec<AprData>,

    #[serde(default, deserialize_with = "flexible_amount")]
    pub last_statement_balance: Option<f64>,
    pub last_statement_issue_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub last_payment_amount: Option<f64>,
    pub last_payment_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub minimum_payment_amount: Option<f64>,
    pub next_payment_due_date: Option<NaiveDate>,
    pub is_overdue: Option<bool>,

    /// Liability-level origination date, when reported
    #[serde(alias = "open_date")]
    pub origination_date: Option<NaiveDate>,

    /// Primary institution-specific limit field
    #[serde(default, deserialize_with = "flexible_amount")]
    pub credit_limit: Option<f64>,
    /// Secondary institution-specific limit field
    #[serde(default, deserialize_with = "flexible_amount")]
    pub limit_current: Option<f64>,
    /// Alternative names a few institutions use instead
    #[serde(default, deserialize_with = "flexible_amount")]
    pub total_credit_line: Option<f64>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub credit_line: Option<f64>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub max_credit_limit: Option<f64>,

    /// Balances sub-object some institutions attach to the liability itself
    pub balances: Option<AccountBalances>,
}

/// Liabilities endpoint response: accounts plus their credit records.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LiabilitiesData {
    #[serde(default)]
    pub accounts: Vec<AccountData>,
    #[serde(default)]
    pub credit: Vec<CreditLiability>,
}

/// Hierarchical category assigned by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransactionCategory {
    pub primary: Option<String>,
    pub detailed: Option<String>,
}

/// A transaction record from the transactions endpoint.
///
/// Sign convention: positive = spend, negative = payment/credit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransactionData {
    pub transaction_id: String,
    pub account_id: Option<String>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub name: Option<String>,
    pub merchant_name: Option<String>,
    #[serde(alias = "personal_finance_category")]
    pub category: Option<TransactionCategory>,
    #[serde(default)]
    pub pending: bool,
    pub iso_currency_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_credit_card_matches_case_insensitively() {
        let account = AccountData {
            account_id: "acc-1".to_string(),
            subtype: Some("Credit Card".to_string()),
            ..Default::default()
        };
        assert!(account.is_credit_card());

        let checking = AccountData {
            account_id: "acc-2".to_string(),
            subtype: Some("checking".to_string()),
            ..Default::default()
        };
        assert!(!checking.is_credit_card());

        let unknown = AccountData {
            account_id: "acc-3".to_string(),
            ..Default::default()
        };
        assert!(!unknown.is_credit_card());
    }

    #[test]
    fn test_display_name_falls_back_to_mask() {
        let account = AccountData {
            account_id: "acc-1".to_string(),
            mask: Some("4321".to_string()),
            ..Default::default()
        };
        assert_eq!(account.display_name(), "Card •4321");
    }

    #[test]
    fn test_sentinel_amounts_parse_to_none() {
        let json = r#"{
            "available": "N/A",
            "current": 1250.75,
            "limit": "Unknown"
        }"#;
        let balances: AccountBalances = serde_json::from_str(json).unwrap();
        assert_eq!(balances.available, None);
        assert_eq!(balances.current, Some(1250.75));
        assert_eq!(balances.limit, None);
    }

    #[test]
    fn test_numeric_string_amounts_parse() {
        let json = r#"{"limit": "5000.00"}"#;
        let balances: AccountBalances = serde_json::from_str(json).unwrap();
        assert_eq!(balances.limit, Some(5000.0));
    }

    #[test]
    fn test_liability_parses_with_aliased_fields() {
        let json = r#"{
            "account_id": "acc-1",
            "aprs": [{"apr_type": "purchase_apr", "apr_percentage": 24.99, "balance_subject_to_apr": 1500.0}],
            "open_date": "2021-03-15",
            "last_statement_balance": 412.33
        }"#;
        let liability: CreditLiability = serde_json::from_str(json).unwrap();
        assert_eq!(
            liability.origination_date,
            Some(NaiveDate::from_ymd_opt(2021, 3, 15).unwrap())
        );
        assert_eq!(liability.aprs.len(), 1);
        assert_eq!(liability.last_statement_balance, Some(412.33));
        assert!(liability.credit_limit.is_none());
    }
}
