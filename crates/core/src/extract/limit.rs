//! Credit-limit extraction cascade.
//!
//! Institutions report credit limits in wildly different places. Each
//! candidate source is a pure strategy over the [`AccountBundle`]; the
//! runner tries them in priority order and records which one produced the
//! value, so institution-specific anomalies can be traced from logs.

use log::{debug, info};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use super::bundle::AccountBundle;

/// A value plus the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome<T> {
    pub value: T,
    pub source: &'static str,
}

/// APR types in the order their subject balances approximate the limit.
const APR_TYPE_PRIORITY: &[&str] = &[
    "purchase_apr",
    "balance_transfer_apr",
    "cash_advance_apr",
    "promotional_apr",
];

type LimitStrategy = fn(&AccountBundle) -> Option<Decimal>;

/// The cascade, highest priority first.
const LIMIT_STRATEGIES: &[(&str, LimitStrategy)] = &[
    ("liability_primary_limit", liability_primary_limit),
    ("liability_secondary_limit", liability_secondary_limit),
    ("apr_balance_subject", apr_balance_subject),
    ("liability_balances_limit", liability_balances_limit),
    ("liability_alternate_fields", liability_alternate_fields),
    ("balance_endpoint_limit", balance_endpoint_limit),
    ("available_plus_current", available_plus_current),
];

/// Run the cascade. `None` means no source produced a valid limit — the
/// limit is explicitly unknown, never zero and never a placeholder.
pub fn extract_credit_limit(bundle: &AccountBundle) -> Option<ExtractionOutcome<Decimal>> {
    for (source, strategy) in LIMIT_STRATEGIES {
        if let Some(value) = strategy(bundle) {
            info!(
                "Credit limit for account {} resolved from '{}': {}",
                bundle.account.account_id, source, value
            );
            return Some(ExtractionOutcome { value, source });
        }
        debug!(
            "Credit limit strategy '{}' produced nothing for account {}",
            source, bundle.account.account_id
        );
    }

    info!(
        "No valid credit limit found for account {}, leaving unset",
        bundle.account.account_id
    );
    None
}

/// A limit is usable only if positive and finite. Sentinel strings were
/// already collapsed to `None` at the wire layer.
fn valid_limit(raw: Option<f64>) -> Option<Decimal> {
    let v = raw?;
    if !v.is_finite() || v <= 0.0 {
        return None;
    }
    Decimal::from_f64(v)
}

fn liability_primary_limit(bundle: &AccountBundle) -> Option<Decimal> {
    valid_limit(bundle.liability?.credit_limit)
}

fn liability_secondary_limit(bundle: &AccountBundle) -> Option<Decimal> {
    valid_limit(bundle.liability?.limit_current)
}

fn apr_balance_subject(bundle: &AccountBundle) -> Option<Decimal> {
    let aprs = &bundle.liability?.aprs;

    for apr_type in APR_TYPE_PRIORITY {
        let found = aprs
            .iter()
            .find(|a| a.apr_type.as_deref() == Some(apr_type))
            .and_then(|a| valid_limit(a.balance_subject_to_apr));
        if found.is_some() {
            return found;
        }
    }

    // Any APR with a positive subject balance beats nothing.
    aprs.iter()
        .find_map(|a| valid_limit(a.balance_subject_to_apr))
}

fn liability_balances_limit(bundle: &AccountBundle) -> Option<Decimal> {
    valid_limit(bundle.liability?.balances.as_ref()?.limit)
}

fn liability_alternate_fields(bundle: &AccountBundle) -> Option<Decimal> {
    let liability = bundle.liability?;
    valid_limit(liability.total_credit_line)
        .or_else(|| valid_limit(liability.credit_line))
        .or_else(|| valid_limit(liability.max_credit_limit))
}

fn balance_endpoint_limit(bundle: &AccountBundle) -> Option<Decimal> {
    bundle
        .balance_sources()
        .into_iter()
        .flatten()
        .find_map(|a| valid_limit(a.balances.as_ref()?.limit))
}

/// Calculated fallback: `available + |current|` from whichever balance
/// source has a positive available amount.
fn available_plus_current(bundle: &AccountBundle) -> Option<Decimal> {
    for source in bundle.balance_sources().into_iter().flatten() {
        let Some(balances) = source.balances.as_ref() else {
            continue;
        };
        let available = match balances.available {
            Some(a) if a.is_finite() && a > 0.0 => a,
            _ => continue,
        };
        let current = balances.current.filter(|c| c.is_finite()).unwrap_or(0.0);
        return valid_limit(Some(available + current.abs()));
    }
    None
}
