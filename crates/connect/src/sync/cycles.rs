//! Billing-cycle record construction.
//!
//! Two fetch scopes produce cycle records for the same card:
//! - the *recent* scope uses liability statement data and yields the last
//!   closed cycle (with statement balance, minimum payment, due date) plus
//!   the currently open one;
//! - the *full history* scope walks statement-anchored monthly windows over
//!   stored transactions and yields spend totals only.
//!
//! The reconciler in `cardsync-core` collapses the overlap.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use cardsync_aggregator::models::CreditLiability;
use cardsync_core::cards::Card;
use cardsync_core::cycles::{BillingCycle, PaymentStatus};
use cardsync_core::transactions::CardTransaction;

/// Most history windows ever derived for one card.
const MAX_HISTORY_CYCLES: usize = 36;

/// Cycles from the recent scope: the last closed statement period and the
/// open one. Empty when the liability has no statement date yet.
pub(crate) fn build_recent_cycles(
    card: &Card,
    liability: Option<&CreditLiability>,
    transactions: &[CardTransaction],
    today: NaiveDate,
) -> Vec<BillingCycle> {
    let Some(liability) = liability else {
        return Vec::new();
    };
    let Some(statement_date) = liability.last_statement_issue_date else {
        return Vec::new();
    };

    let mut cycles = Vec::new();

    // Closed cycle ending at the statement date.
    if let Some(start) = cycle_start_for_end(statement_date) {
        let (spend, count) = window_totals(transactions, start, statement_date);
        cycles.push(BillingCycle {
            id: uuid::Uuid::new_v4().to_string(),
            card_id: card.id.clone(),
            start_date: start,
            end_date: statement_date,
            total_spend: spend,
            transaction_count: count,
            statement_balance: liability
                .last_statement_balance
                .and_then(Decimal::from_f64),
            minimum_payment: liability
                .minimum_payment_amount
                .and_then(Decimal::from_f64),
            due_date: liability.next_payment_due_date,
            payment_status: infer_payment_status(liability, today),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });
    }

    // The ongoing cycle since the statement.
    if statement_date < today {
        let start = statement_date + Days::new(1);
        let (spend, count) = window_totals(transactions, start, today);
        cycles.push(BillingCycle {
            id: uuid::Uuid::new_v4().to_string(),
            card_id: card.id.clone(),
            start_date: start,
            end_date: today,
            total_spend: spend,
            transaction_count: count,
            statement_balance: None,
            minimum_payment: None,
            due_date: None,
            payment_status: PaymentStatus::Current,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });
    }

    cycles
}

/// Cycles from the full-history scope: statement-anchored monthly windows
/// walked back over stored transactions, spend totals only.
pub(crate) fn build_history_cycles(
    card: &Card,
    transactions: &[CardTransaction],
    today: NaiveDate,
) -> Vec<BillingCycle> {
    let Some(earliest) = transactions.iter().map(|t| t.date).min() else {
        return Vec::new();
    };
    let anchor = card.last_statement_date.unwrap_or(today);

    let mut cycles = Vec::new();
    let mut window_end = anchor;

    while cycles.len() < MAX_HISTORY_CYCLES {
        let Some(window_start) = cycle_start_for_end(window_end) else {
            break;
        };
        if window_end < earliest {
            break;
        }

        let (spend, count) = window_totals(transactions, window_start, window_end);
        if count > 0 {
            cycles.push(BillingCycle {
                id: uuid::Uuid::new_v4().to_string(),
                card_id: card.id.clone(),
                start_date: window_start,
                end_date: window_end,
                total_spend: spend,
                transaction_count: count,
                statement_balance: None,
                minimum_payment: None,
                due_date: None,
                payment_status: PaymentStatus::Current,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            });
        }

        let Some(previous_end) = window_start.checked_sub_days(Days::new(1)) else {
            break;
        };
        window_end = previous_end;
    }

    cycles
}

/// A cycle ending on `end` starts one month earlier, exclusive.
fn cycle_start_for_end(end: NaiveDate) -> Option<NaiveDate> {
    end.checked_sub_months(Months::new(1))?
        .checked_add_days(Days::new(1))
}

/// Spend total (positive amounts only) and transaction count within
/// `[start, end]`.
fn window_totals(
    transactions: &[CardTransaction],
    start: NaiveDate,
    end: NaiveDate,
) -> (Decimal, i64) {
    let mut spend = Decimal::ZERO;
    let mut count = 0i64;
    for tx in transactions {
        if tx.date < start || tx.date > end {
            continue;
        }
        count += 1;
        if tx.amount > Decimal::ZERO {
            spend += tx.amount;
        }
    }
    (spend, count)
}

fn infer_payment_status(liability: &CreditLiability, today: NaiveDate) -> PaymentStatus {
    if liability.is_overdue == Some(true) {
        return PaymentStatus::Outstanding;
    }

    if let (Some(paid), Some(balance)) =
        (liability.last_payment_amount, liability.last_statement_balance)
    {
        if balance > 0.0 && paid >= balance {
            return PaymentStatus::Paid;
        }
    }

    match (liability.next_payment_due_date, liability.last_statement_balance) {
        (Some(due), Some(balance)) if due >= today && balance > 0.0 => PaymentStatus::Due,
        _ => PaymentStatus::Current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn card() -> Card {
        let now = Utc::now();
        Card {
            id: "card-1".to_string(),
            connection_id: "conn-1".to_string(),
            external_account_id: "ext-1".to_string(),
            name: "Card".to_string(),
            mask: None,
            current_balance: None,
            available_balance: None,
            credit_limit: None,
            is_manual_limit: false,
            manual_limit: None,
            last_statement_balance: None,
            last_statement_date: Some(date(2025, 7, 14)),
            next_payment_due_date: None,
            minimum_payment: None,
            open_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn tx(id: &str, on: NaiveDate, amount: Decimal) -> CardTransaction {
        let now = Utc::now();
        CardTransaction {
            external_id: id.to_string(),
            card_id: Some("card-1".to_string()),
            connection_id: "conn-1".to_string(),
            amount,
            date: on,
            name: None,
            merchant_name: None,
            category_primary: None,
            category_detailed: None,
            pending: false,
            needs_review: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_recent_scope_yields_closed_and_open_cycles() {
        let liability = CreditLiability {
            account_id: Some("ext-1".to_string()),
            last_statement_issue_date: Some(date(2025, 7, 14)),
            last_statement_balance: Some(412.50),
            minimum_payment_amount: Some(35.0),
            next_payment_due_date: Some(date(2025, 8, 8)),
            ..Default::default()
        };
        let transactions = vec![
            tx("t1", date(2025, 6, 20), dec!(100)),
            tx("t2", date(2025, 7, 2), dec!(50)),
            tx("t3", date(2025, 7, 20), dec!(75)),   // after statement
            tx("t4", date(2025, 7, 25), dec!(-60)),  // payment, not spend
        ];

        let cycles = build_recent_cycles(&card(), Some(&liability), &transactions, date(2025, 8, 1));

        assert_eq!(cycles.len(), 2);
        let closed = &cycles[0];
        assert_eq!(closed.end_date, date(2025, 7, 14));
        assert_eq!(closed.start_date, date(2025, 6, 15));
        assert_eq!(closed.total_spend, dec!(150));
        assert_eq!(closed.transaction_count, 2);
        assert_eq!(closed.statement_balance, Some(dec!(412.50)));
        assert_eq!(closed.due_date, Some(date(2025, 8, 8)));
        assert_eq!(closed.payment_status, PaymentStatus::Due);

        let open = &cycles[1];
        assert_eq!(open.start_date, date(2025, 7, 15));
        assert_eq!(open.end_date, date(2025, 8, 1));
        assert_eq!(open.total_spend, dec!(75));
        assert_eq!(open.transaction_count, 2);
        assert!(open.statement_balance.is_none());
    }

    #[test]
    fn test_recent_scope_empty_without_statement_date() {
        let liability = CreditLiability {
            account_id: Some("ext-1".to_string()),
            ..Default::default()
        };
        let cycles = build_recent_cycles(&card(), Some(&liability), &[], date(2025, 8, 1));
        assert!(cycles.is_empty());
    }

    #[test]
    fn test_history_scope_walks_back_to_earliest_transaction() {
        let transactions = vec![
            tx("t1", date(2025, 3, 1), dec!(10)),
            tx("t2", date(2025, 5, 1), dec!(20)),
            tx("t3", date(2025, 7, 1), dec!(30)),
        ];

        let cycles = build_history_cycles(&card(), &transactions, date(2025, 8, 1));

        // Only windows containing transactions are emitted.
        assert!(!cycles.is_empty());
        assert!(cycles.len() <= 5);
        let total_count: i64 = cycles.iter().map(|c| c.transaction_count).sum();
        assert_eq!(total_count, 3);
        assert!(cycles.iter().all(|c| !c.has_closing_data()));
    }

    #[test]
    fn test_history_scope_empty_without_transactions() {
        assert!(build_history_cycles(&card(), &[], date(2025, 8, 1)).is_empty());
    }

    #[test]
    fn test_paid_statement_infers_paid_status() {
        let liability = CreditLiability {
            last_statement_balance: Some(200.0),
            last_payment_amount: Some(200.0),
            next_payment_due_date: Some(date(2025, 8, 20)),
            ..Default::default()
        };
        assert_eq!(
            infer_payment_status(&liability, date(2025, 8, 1)),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_overdue_wins_over_everything() {
        let liability = CreditLiability {
            is_overdue: Some(true),
            last_statement_balance: Some(200.0),
            last_payment_amount: Some(200.0),
            ..Default::default()
        };
        assert_eq!(
            infer_payment_status(&liability, date(2025, 8, 1)),
            PaymentStatus::Outstanding
        );
    }
}
