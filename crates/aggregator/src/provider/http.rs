//! HTTP client for the aggregator API.
//!
//! Speaks the aggregator's POST-JSON wire protocol and maps its error
//! envelope onto [`AggregatorError`]. No retrying happens here; callers wrap
//! calls in the retry executor.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

use crate::errors::AggregatorError;
use crate::models::{
    AccountData, Institution, LiabilitiesData, LinkToken, TokenExchange, TransactionData,
};

use super::traits::AggregatorClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size for the transactions endpoint.
const TRANSACTIONS_PAGE_SIZE: usize = 500;

/// Error codes that mean the credential must be relinked.
const RECONNECT_ERROR_CODES: &[&str] = &[
    "ITEM_LOGIN_REQUIRED",
    "INVALID_ACCESS_TOKEN",
    "ITEM_LOCKED",
    "INVALID_CREDENTIALS",
    "ITEM_NOT_FOUND",
];

/// Error envelope the aggregator wraps failures in.
#[derive(Debug, serde::Deserialize, Default)]
struct ApiErrorBody {
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ExchangeResponse {
    access_token: String,
    item_id: String,
}

#[derive(Debug, serde::Deserialize)]
struct InstitutionResponse {
    institution: Institution,
}

#[derive(Debug, serde::Deserialize)]
struct ItemResponse {
    item: ItemBody,
}

#[derive(Debug, serde::Deserialize)]
struct ItemBody {
    institution_id: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    accounts: Vec<AccountData>,
}

#[derive(Debug, serde::Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<TransactionData>,
    #[serde(default)]
    total_transactions: Option<usize>,
}

#[derive(Debug, serde::Deserialize)]
struct LinkTokenResponse {
    link_token: String,
    expiration: Option<String>,
}

/// Aggregator client over HTTPS.
pub struct HttpAggregatorClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    secret: String,
}

impl HttpAggregatorClient {
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            secret: secret.into(),
        }
    }

    /// POST a JSON body to `path` and decode the response.
    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AggregatorError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let mut payload = serde_json::to_value(body)
            .map_err(|e| AggregatorError::Decode(e.to_string()))?;
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("client_id".to_string(), json!(self.client_id));
            obj.insert("secret".to_string(), json!(self.secret));
        }

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Self::map_transport_error(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::map_api_error(path, status, &text));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_transport_error(path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AggregatorError::Decode(format!("{}: {}", path, e))
        })
    }

    fn map_transport_error(path: &str, err: reqwest::Error) -> AggregatorError {
        if err.is_timeout() {
            AggregatorError::Timeout {
                operation: path.to_string(),
            }
        } else if err.is_connect() {
            AggregatorError::ConnectionReset {
                operation: path.to_string(),
            }
        } else {
            AggregatorError::Network(err)
        }
    }

    fn map_api_error(path: &str, status: StatusCode, body: &str) -> AggregatorError {
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
        let code = parsed.error_code.unwrap_or_default();
        let message = parsed
            .error_message
            .unwrap_or_else(|| body.chars().take(200).collect());

        if status == StatusCode::TOO_MANY_REQUESTS || code.starts_with("RATE_LIMIT") {
            return AggregatorError::RateLimited {
                operation: path.to_string(),
            };
        }
        if RECONNECT_ERROR_CODES.contains(&code.as_str()) {
            return AggregatorError::InvalidCredentials { code };
        }
        if parsed.error_type.as_deref() == Some("INSTITUTION_ERROR")
            || code.starts_with("INSTITUTION_")
        {
            return AggregatorError::InstitutionError { code, message };
        }

        AggregatorError::RequestFailed {
            status: status.as_u16(),
            message: if code.is_empty() {
                message
            } else {
                format!("{}: {}", code, message)
            },
        }
    }
}

#[async_trait]
impl AggregatorClient for HttpAggregatorClient {
    async fn exchange_token(&self, public_token: &str) -> Result<TokenExchange, AggregatorError> {
        let resp: ExchangeResponse = self
            .post(
                "/item/public_token/exchange",
                &json!({ "public_token": public_token }),
            )
            .await?;
        Ok(TokenExchange {
            access_token: resp.access_token,
            item_id: resp.item_id,
        })
    }

    async fn get_institution(&self, item_id: &str) -> Result<Institution, AggregatorError> {
        // Two hops: the item names its institution id, then the institution
        // record carries the display name.
        let item: ItemResponse = self
            .post("/item/get", &json!({ "item_id": item_id }))
            .await?;

        let Some(institution_id) = item.item.institution_id else {
            return Ok(Institution::default());
        };

        let resp: InstitutionResponse = self
            .post(
                "/institutions/get_by_id",
                &json!({ "institution_id": institution_id }),
            )
            .await?;
        Ok(resp.institution)
    }

    async fn get_accounts(&self, access_token: &str) -> Result<Vec<AccountData>, AggregatorError> {
        let resp: AccountsResponse = self
            .post("/accounts/get", &json!({ "access_token": access_token }))
            .await?;
        Ok(resp.accounts)
    }

    async fn get_liabilities(
        &self,
        access_token: &str,
    ) -> Result<LiabilitiesData, AggregatorError> {
        self.post("/liabilities/get", &json!({ "access_token": access_token }))
            .await
    }

    async fn get_balances(
        &self,
        access_token: &str,
        min_last_updated: Option<DateTime<Utc>>,
    ) -> Result<Vec<AccountData>, AggregatorError> {
        let mut body = json!({ "access_token": access_token });
        if let Some(min) = min_last_updated {
            body["options"] = json!({ "min_last_updated_datetime": min.to_rfc3339() });
        }
        let resp: AccountsResponse = self.post("/accounts/balance/get", &body).await?;
        Ok(resp.accounts)
    }

    async fn get_transactions(
        &self,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TransactionData>, AggregatorError> {
        let mut all: Vec<TransactionData> = Vec::new();

        loop {
            let body = json!({
                "access_token": access_token,
                "start_date": start_date.format("%Y-%m-%d").to_string(),
                "end_date": end_date.format("%Y-%m-%d").to_string(),
                "options": {
                    "count": TRANSACTIONS_PAGE_SIZE,
                    "offset": all.len(),
                },
            });
            let page: TransactionsResponse = self.post("/transactions/get", &body).await?;

            let received = page.transactions.len();
            all.extend(page.transactions);

            let total = page.total_transactions.unwrap_or(all.len());
            if received == 0 || all.len() >= total {
                break;
            }
        }

        Ok(all)
    }

    async fn create_link_token(&self, user_id: &str) -> Result<LinkToken, AggregatorError> {
        let resp: LinkTokenResponse = self
            .post(
                "/link/token/create",
                &json!({ "user": { "client_user_id": user_id } }),
            )
            .await?;
        Ok(LinkToken {
            link_token: resp.link_token,
            expiration: resp.expiration,
        })
    }

    async fn create_update_link_token(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> Result<LinkToken, AggregatorError> {
        let resp: LinkTokenResponse = self
            .post(
                "/link/token/create",
                &json!({
                    "user": { "client_user_id": user_id },
                    "update": { "item_id": item_id },
                }),
            )
            .await?;
        Ok(LinkToken {
            link_token: resp.link_token,
            expiration: resp.expiration,
        })
    }

    async fn remove_item(&self, access_token: &str) -> Result<(), AggregatorError> {
        let _: serde_json::Value = self
            .post("/item/remove", &json!({ "access_token": access_token }))
            .await?;
        Ok(())
    }
}
