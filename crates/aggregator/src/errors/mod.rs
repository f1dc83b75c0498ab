//! Error types and retry classification for the aggregator crate.
//!
//! This module provides:
//! - [`AggregatorError`]: The main error enum for all aggregator operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur when talking to the bank-data aggregator.
///
/// Each variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class), which drives the retry executor.
#[derive(Error, Debug)]
pub enum AggregatorError {
    /// The aggregator throttled the request (HTTP 429 or explicit
    /// rate-limit error code). Retried with exponential backoff.
    #[error("Rate limited: {operation}")]
    RateLimited {
        /// The operation that was throttled
        operation: String,
    },

    /// All rate-limit retries were exhausted without a success.
    ///
    /// Distinct from [`RequestFailed`](Self::RequestFailed) so callers can
    /// degrade gracefully (e.g. continue the sync with an empty result)
    /// instead of treating it as a hard failure.
    #[error("Rate limit retries exhausted: {operation}")]
    RateLimitExceeded {
        /// The operation that never got through
        operation: String,
    },

    /// The request to the aggregator timed out.
    #[error("Timeout: {operation}")]
    Timeout {
        /// The operation that timed out
        operation: String,
    },

    /// The connection was reset mid-request.
    #[error("Connection reset: {operation}")]
    ConnectionReset {
        /// The operation that was interrupted
        operation: String,
    },

    /// The stored access credential is invalid or expired.
    ///
    /// Never retried; callers surface this as "requires reconnection" and
    /// drive the reconnection flow.
    #[error("Credential invalid or expired: {code}")]
    InvalidCredentials {
        /// Aggregator error code (e.g. ITEM_LOGIN_REQUIRED)
        code: String,
    },

    /// The institution behind the item failed to respond usefully.
    #[error("Institution error: {code} - {message}")]
    InstitutionError {
        /// Aggregator error code
        code: String,
        /// Human-readable message from the aggregator
        message: String,
    },

    /// The aggregator rejected the request for any other reason.
    #[error("Request failed ({status}): {message}")]
    RequestFailed {
        /// HTTP status code
        status: u16,
        /// Response body or error message
        message: String,
    },

    /// The aggregator returned a body we could not decode.
    #[error("Failed to decode aggregator response: {0}")]
    Decode(String),

    /// A network error occurred below the HTTP layer.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AggregatorError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use cardsync_aggregator::errors::{AggregatorError, RetryClass};
    ///
    /// let error = AggregatorError::RateLimited { operation: "get_transactions".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::RateLimit);
    ///
    /// let error = AggregatorError::InvalidCredentials { code: "ITEM_LOGIN_REQUIRED".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::Terminal);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } => RetryClass::RateLimit,

            Self::Timeout { .. } | Self::ConnectionReset { .. } => RetryClass::Transient,

            // Exhausted retries are terminal by definition; everything else
            // is a request-shaped or credential problem retrying can't fix.
            Self::RateLimitExceeded { .. }
            | Self::InvalidCredentials { .. }
            | Self::InstitutionError { .. }
            | Self::RequestFailed { .. }
            | Self::Decode(_)
            | Self::Network(_) => RetryClass::Terminal,
        }
    }

    /// True when the error means the item credential must be relinked.
    pub fn requires_reconnection(&self) -> bool {
        matches!(self, Self::InvalidCredentials { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_retries_with_backoff() {
        let error = AggregatorError::RateLimited {
            operation: "get_transactions".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::RateLimit);
    }

    #[test]
    fn test_timeout_is_transient() {
        let error = AggregatorError::Timeout {
            operation: "get_accounts".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Transient);
    }

    #[test]
    fn test_connection_reset_is_transient() {
        let error = AggregatorError::ConnectionReset {
            operation: "get_balances".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Transient);
    }

    #[test]
    fn test_invalid_credentials_never_retries() {
        let error = AggregatorError::InvalidCredentials {
            code: "ITEM_LOGIN_REQUIRED".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Terminal);
        assert!(error.requires_reconnection());
    }

    #[test]
    fn test_rate_limit_exceeded_never_retries() {
        let error = AggregatorError::RateLimitExceeded {
            operation: "get_transactions".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Terminal);
    }

    #[test]
    fn test_request_failed_never_retries() {
        let error = AggregatorError::RequestFailed {
            status: 400,
            message: "INVALID_FIELD".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Terminal);
        assert!(!error.requires_reconnection());
    }

    #[test]
    fn test_error_display() {
        let error = AggregatorError::RateLimited {
            operation: "get_transactions".to_string(),
        };
        assert_eq!(format!("{}", error), "Rate limited: get_transactions");

        let error = AggregatorError::InstitutionError {
            code: "INSTITUTION_DOWN".to_string(),
            message: "institution not responding".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Institution error: INSTITUTION_DOWN - institution not responding"
        );
    }
}
