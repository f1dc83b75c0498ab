//! Billing-cycle reconciliation.
//!
//! A "recent" fetch scope returns only the newest cycle or two while a
//! "full history" scope returns all of them, and the two disagree about
//! which fields are populated. Reconciliation collapses overlapping records
//! to one per `(card, start, end)` key, preferring the richer record.

use log::debug;
use std::collections::HashMap;

use chrono::NaiveDate;

use super::cycles_model::BillingCycle;

/// Collapse `cycles` to one record per `(card_id, start_date, end_date)`.
///
/// Preference between two records sharing a key:
/// 1. the one with cycle-closing data (statement balance, minimum payment,
///    or due date),
/// 2. the one with the higher transaction count,
/// 3. the one with the larger absolute total spend,
/// 4. the incumbent.
///
/// The result is sorted by start date descending.
pub fn reconcile_cycles(cycles: Vec<BillingCycle>) -> Vec<BillingCycle> {
    let input_len = cycles.len();
    let mut by_key: HashMap<(String, NaiveDate, NaiveDate), BillingCycle> = HashMap::new();

    for cycle in cycles {
        let key = cycle.key();
        match by_key.remove(&key) {
            None => {
                by_key.insert(key, cycle);
            }
            Some(incumbent) => {
                let winner = prefer(incumbent, cycle);
                by_key.insert(key, winner);
            }
        }
    }

    let mut result: Vec<BillingCycle> = by_key.into_values().collect();
    result.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    if result.len() < input_len {
        debug!(
            "Reconciled {} cycle records down to {}",
            input_len,
            result.len()
        );
    }
    result
}

/// Pick the richer of two records sharing a key. `a` is the incumbent and
/// wins ties.
fn prefer(a: BillingCycle, b: BillingCycle) -> BillingCycle {
    match (a.has_closing_data(), b.has_closing_data()) {
        (true, false) => return a,
        (false, true) => return b,
        _ => {}
    }

    if b.transaction_count != a.transaction_count {
        return if b.transaction_count > a.transaction_count {
            b
        } else {
            a
        };
    }

    if b.total_spend.abs() > a.total_spend.abs() {
        b
    } else {
        a
    }
}
