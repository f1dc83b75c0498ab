//! Account-open-date extraction cascade.
//!
//! The open date anchors billing-cycle history, so an implausible value is
//! worse than a rough estimate. Aggregator-provided origination dates are
//! trusted (clamped only to "not in the future"); estimated dates are also
//! kept within a bounded margin of the earliest observed transaction.

use log::{debug, info};

use chrono::{Days, Months, NaiveDate};

use super::bundle::AccountBundle;
use super::limit::ExtractionOutcome;
use crate::constants::{
    OPEN_DATE_DEFAULT_LOOKBACK_MONTHS, OPEN_DATE_MAX_DAYS_BEFORE_FIRST_TRANSACTION,
    OPEN_DATE_PLAUSIBILITY_MONTHS, OPEN_DATE_TRANSACTION_MARGIN_DAYS,
};

/// Inputs for open-date extraction beyond the account bundle.
pub struct OpenDateInputs<'a> {
    pub bundle: &'a AccountBundle<'a>,
    /// Open date already stored on the card, if any
    pub existing_open_date: Option<NaiveDate>,
    /// Earliest stored transaction date for the card, if any
    pub earliest_transaction: Option<NaiveDate>,
    /// Injected so estimation is deterministic under test
    pub today: NaiveDate,
}

struct OpenDateStrategy {
    source: &'static str,
    /// True when the date comes from the aggregator rather than estimation.
    /// Provided dates may legitimately precede all observed history
    /// (restricted institutions cap the transaction window, not the
    /// account's age).
    provided: bool,
    run: fn(&OpenDateInputs) -> Option<NaiveDate>,
}

/// The cascade, highest priority first. The final entry always yields.
const OPEN_DATE_STRATEGIES: &[OpenDateStrategy] = &[
    OpenDateStrategy {
        source: "liability_origination",
        provided: true,
        run: liability_origination,
    },
    OpenDateStrategy {
        source: "account_origination",
        provided: true,
        run: account_origination,
    },
    OpenDateStrategy {
        source: "statement_offset",
        provided: false,
        run: statement_offset,
    },
    OpenDateStrategy {
        source: "existing_plausible",
        provided: false,
        run: existing_plausible,
    },
    OpenDateStrategy {
        source: "earliest_transaction_margin",
        provided: false,
        run: earliest_transaction_margin,
    },
    OpenDateStrategy {
        source: "default_lookback",
        provided: false,
        run: default_lookback,
    },
];

/// Run the cascade. Always produces a date; the default-lookback fallback
/// cannot fail.
pub fn extract_open_date(inputs: &OpenDateInputs) -> ExtractionOutcome<NaiveDate> {
    for strategy in OPEN_DATE_STRATEGIES {
        if let Some(raw) = (strategy.run)(inputs) {
            let value = clamp_plausible(raw, strategy.provided, inputs);
            if value != raw {
                debug!(
                    "Open date for account {} from '{}' clamped {} -> {}",
                    inputs.bundle.account.account_id, strategy.source, raw, value
                );
            }
            info!(
                "Open date for account {} resolved from '{}': {}",
                inputs.bundle.account.account_id, strategy.source, value
            );
            return ExtractionOutcome {
                value,
                source: strategy.source,
            };
        }
        debug!(
            "Open date strategy '{}' produced nothing for account {}",
            strategy.source, inputs.bundle.account.account_id
        );
    }

    // The table ends in default_lookback, which always yields.
    unreachable!("open-date cascade has a total fallback")
}

/// Never in the future; estimated dates also stay within a bounded margin
/// of the earliest observed transaction.
fn clamp_plausible(date: NaiveDate, provided: bool, inputs: &OpenDateInputs) -> NaiveDate {
    let mut value = date.min(inputs.today);

    if !provided {
        if let Some(earliest) = inputs.earliest_transaction {
            let floor = earliest
                .checked_sub_days(Days::new(
                    OPEN_DATE_MAX_DAYS_BEFORE_FIRST_TRANSACTION as u64,
                ))
                .unwrap_or(earliest);
            value = value.max(floor);
        }
    }

    value
}

fn liability_origination(inputs: &OpenDateInputs) -> Option<NaiveDate> {
    inputs.bundle.liability?.origination_date
}

fn account_origination(inputs: &OpenDateInputs) -> Option<NaiveDate> {
    inputs
        .bundle
        .balance_sources()
        .into_iter()
        .flatten()
        .find_map(|a| a.origination_date)
}

/// First statement issue date, offset backward by the institution family's
/// typical statement lag.
fn statement_offset(inputs: &OpenDateInputs) -> Option<NaiveDate> {
    let statement_date = inputs.bundle.liability?.last_statement_issue_date?;
    statement_date.checked_sub_months(Months::new(
        inputs.bundle.policy.origination_offset_months,
    ))
}

/// Keep a stored open date only while it stays inside the plausibility
/// window; a stale guess gets discarded and re-estimated.
fn existing_plausible(inputs: &OpenDateInputs) -> Option<NaiveDate> {
    let existing = inputs.existing_open_date?;
    let oldest_plausible = inputs
        .today
        .checked_sub_months(Months::new(OPEN_DATE_PLAUSIBILITY_MONTHS))?;

    if existing > inputs.today || existing < oldest_plausible {
        debug!(
            "Stored open date {} for account {} outside plausibility window, discarding",
            existing, inputs.bundle.account.account_id
        );
        return None;
    }
    Some(existing)
}

/// The most reliable estimate: observed activity minus a fixed margin.
fn earliest_transaction_margin(inputs: &OpenDateInputs) -> Option<NaiveDate> {
    inputs
        .earliest_transaction?
        .checked_sub_days(Days::new(OPEN_DATE_TRANSACTION_MARGIN_DAYS as u64))
}

fn default_lookback(inputs: &OpenDateInputs) -> Option<NaiveDate> {
    inputs
        .today
        .checked_sub_months(Months::new(OPEN_DATE_DEFAULT_LOOKBACK_MONTHS))
}
