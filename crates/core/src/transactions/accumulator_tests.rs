//! Tests for the transaction accumulator: upsert idempotence, never-delete,
//! monotonic accumulation, and per-record fallback behavior.

#[cfg(test)]
mod tests {
    use crate::errors::{Error, Result};
    use crate::transactions::{
        CardTransaction, TransactionAccumulator, TransactionRepositoryTrait,
    };
    use async_trait::async_trait;
    use cardsync_aggregator::models::TransactionData;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    // --- Mock TransactionRepository ---
    #[derive(Default)]
    struct MockTransactionRepository {
        rows: Mutex<HashMap<String, CardTransaction>>,
        fail_batch: AtomicBool,
        fail_single_ids: Mutex<HashSet<String>>,
    }

    impl MockTransactionRepository {
        fn new() -> Self {
            Self::default()
        }

        fn count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        fn get(&self, external_id: &str) -> Option<CardTransaction> {
            self.rows.lock().unwrap().get(external_id).cloned()
        }

        fn poison_batch(&self) {
            self.fail_batch.store(true, Ordering::SeqCst);
        }

        fn poison_single(&self, external_id: &str) {
            self.fail_single_ids
                .lock()
                .unwrap()
                .insert(external_id.to_string());
        }
    }

    #[async_trait]
    impl TransactionRepositoryTrait for MockTransactionRepository {
        async fn upsert_batch(&self, transactions: Vec<CardTransaction>) -> Result<usize> {
            if self.fail_batch.load(Ordering::SeqCst) {
                return Err(Error::Repository("batch write failed".to_string()));
            }
            let written = transactions.len();
            let mut rows = self.rows.lock().unwrap();
            for tx in transactions {
                rows.insert(tx.external_id.clone(), tx);
            }
            Ok(written)
        }

        async fn upsert_single(&self, transaction: CardTransaction) -> Result<()> {
            if self
                .fail_single_ids
                .lock()
                .unwrap()
                .contains(&transaction.external_id)
            {
                return Err(Error::Repository("row write failed".to_string()));
            }
            self.rows
                .lock()
                .unwrap()
                .insert(transaction.external_id.clone(), transaction);
            Ok(())
        }

        fn get_by_external_id(&self, external_id: &str) -> Result<Option<CardTransaction>> {
            Ok(self.get(external_id))
        }

        fn list_by_card(&self, card_id: &str) -> Result<Vec<CardTransaction>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.card_id.as_deref() == Some(card_id))
                .cloned()
                .collect())
        }

        fn list_by_connection(&self, connection_id: &str) -> Result<Vec<CardTransaction>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.connection_id == connection_id)
                .cloned()
                .collect())
        }

        fn count_older_than(&self, connection_id: &str, cutoff: NaiveDate) -> Result<i64> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.connection_id == connection_id && t.date < cutoff)
                .count() as i64)
        }

        fn earliest_date_for_card(&self, card_id: &str) -> Result<Option<NaiveDate>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.card_id.as_deref() == Some(card_id))
                .map(|t| t.date)
                .min())
        }

        fn count_for_card(&self, card_id: &str) -> Result<i64> {
            Ok(self.list_by_card(card_id)?.len() as i64)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(id: &str, account: &str, amount: f64, day: u32) -> TransactionData {
        TransactionData {
            transaction_id: id.to_string(),
            account_id: Some(account.to_string()),
            amount: Some(amount),
            date: Some(date(2025, 6, day)),
            name: Some(format!("merchant for {}", id)),
            ..Default::default()
        }
    }

    fn card_index() -> HashMap<String, String> {
        HashMap::from([("ext-acc-1".to_string(), "card-1".to_string())])
    }

    #[tokio::test]
    async fn test_upsert_idempotence_keeps_latest_fields() {
        let repo = Arc::new(MockTransactionRepository::new());
        let accumulator = TransactionAccumulator::new(repo.clone());
        let index = card_index();
        let window = date(2025, 6, 1);

        let first = tx("tx-1", "ext-acc-1", 25.00, 10);
        accumulator
            .accumulate("conn-1", &index, vec![first], window)
            .await
            .unwrap();

        let mut second = tx("tx-1", "ext-acc-1", 27.50, 10);
        second.merchant_name = Some("Corrected Merchant".to_string());
        accumulator
            .accumulate("conn-1", &index, vec![second], window)
            .await
            .unwrap();

        assert_eq!(repo.count(), 1);
        let stored = repo.get("tx-1").unwrap();
        assert_eq!(stored.amount, dec!(27.50));
        assert_eq!(stored.merchant_name.as_deref(), Some("Corrected Merchant"));
    }

    #[tokio::test]
    async fn test_sync_never_deletes_out_of_window_transactions() {
        let repo = Arc::new(MockTransactionRepository::new());
        let accumulator = TransactionAccumulator::new(repo.clone());
        let index = card_index();

        // Old transaction from a wide first sync.
        accumulator
            .accumulate(
                "conn-1",
                &index,
                vec![tx("tx-old", "ext-acc-1", 10.0, 1)],
                date(2025, 6, 1),
            )
            .await
            .unwrap();

        // Later sync whose window no longer covers tx-old.
        let report = accumulator
            .accumulate(
                "conn-1",
                &index,
                vec![tx("tx-new", "ext-acc-1", 20.0, 20)],
                date(2025, 6, 15),
            )
            .await
            .unwrap();

        assert_eq!(repo.count(), 2);
        assert!(repo.get("tx-old").is_some());
        assert_eq!(report.preserved_older, 1);
    }

    #[tokio::test]
    async fn test_accumulation_is_monotonic_across_shrinking_windows() {
        let repo = Arc::new(MockTransactionRepository::new());
        let accumulator = TransactionAccumulator::new(repo.clone());
        let index = card_index();

        let mut last_count = 0;
        // Each sync returns a different, progressively narrower slice.
        let slices: Vec<Vec<TransactionData>> = vec![
            vec![
                tx("tx-1", "ext-acc-1", 10.0, 1),
                tx("tx-2", "ext-acc-1", 11.0, 5),
                tx("tx-3", "ext-acc-1", 12.0, 9),
            ],
            vec![tx("tx-2", "ext-acc-1", 11.0, 5), tx("tx-4", "ext-acc-1", 13.0, 12)],
            vec![tx("tx-4", "ext-acc-1", 13.0, 12)],
        ];

        for slice in slices {
            accumulator
                .accumulate("conn-1", &index, slice, date(2025, 6, 1))
                .await
                .unwrap();
            let count = repo.count();
            assert!(count >= last_count, "stored count regressed");
            last_count = count;
        }
        assert_eq!(last_count, 4);
    }

    #[tokio::test]
    async fn test_nan_amount_skipped_without_aborting_batch() {
        let repo = Arc::new(MockTransactionRepository::new());
        let accumulator = TransactionAccumulator::new(repo.clone());
        let index = card_index();

        let mut batch: Vec<TransactionData> = (0..49)
            .map(|i| tx(&format!("tx-{}", i), "ext-acc-1", 5.0 + i as f64, 1 + (i % 28)))
            .collect();
        batch.push(tx("tx-nan", "ext-acc-1", f64::NAN, 15));

        let report = accumulator
            .accumulate("conn-1", &index, batch, date(2025, 6, 1))
            .await
            .unwrap();

        assert_eq!(report.fetched, 50);
        assert_eq!(report.stored, 49);
        assert_eq!(report.skipped, 1);
        assert_eq!(repo.count(), 49);
        assert!(repo.get("tx-nan").is_none());
    }

    #[tokio::test]
    async fn test_missing_and_implausible_amounts_are_skipped() {
        let repo = Arc::new(MockTransactionRepository::new());
        let accumulator = TransactionAccumulator::new(repo.clone());
        let index = card_index();

        let mut no_amount = tx("tx-none", "ext-acc-1", 0.0, 2);
        no_amount.amount = None;
        let huge = tx("tx-huge", "ext-acc-1", 2_500_000.0, 3);

        let report = accumulator
            .accumulate("conn-1", &index, vec![no_amount, huge], date(2025, 6, 1))
            .await
            .unwrap();

        assert_eq!(report.stored, 0);
        assert_eq!(report.skipped, 2);
    }

    #[tokio::test]
    async fn test_zero_amount_stored_but_flagged() {
        let repo = Arc::new(MockTransactionRepository::new());
        let accumulator = TransactionAccumulator::new(repo.clone());
        let index = card_index();

        let report = accumulator
            .accumulate(
                "conn-1",
                &index,
                vec![tx("tx-zero", "ext-acc-1", 0.0, 4)],
                date(2025, 6, 1),
            )
            .await
            .unwrap();

        assert_eq!(report.stored, 1);
        assert_eq!(report.flagged_for_review, 1);
        assert!(repo.get("tx-zero").unwrap().needs_review);
    }

    #[tokio::test]
    async fn test_unresolved_account_stored_with_null_card() {
        let repo = Arc::new(MockTransactionRepository::new());
        let accumulator = TransactionAccumulator::new(repo.clone());
        let index = card_index();

        let report = accumulator
            .accumulate(
                "conn-1",
                &index,
                vec![tx("tx-orphan", "ext-acc-unknown", 42.0, 6)],
                date(2025, 6, 1),
            )
            .await
            .unwrap();

        assert_eq!(report.stored, 1);
        assert_eq!(report.unresolved_account, 1);
        assert!(repo.get("tx-orphan").unwrap().card_id.is_none());
    }

    #[tokio::test]
    async fn test_batch_failure_falls_back_to_per_record_writes() {
        let repo = Arc::new(MockTransactionRepository::new());
        repo.poison_batch();
        repo.poison_single("tx-bad");
        let accumulator = TransactionAccumulator::new(repo.clone());
        let index = card_index();

        let batch = vec![
            tx("tx-a", "ext-acc-1", 1.0, 1),
            tx("tx-bad", "ext-acc-1", 2.0, 2),
            tx("tx-b", "ext-acc-1", 3.0, 3),
        ];

        let report = accumulator
            .accumulate("conn-1", &index, batch, date(2025, 6, 1))
            .await
            .unwrap();

        // The poisoned row is lost but the rest of the batch survives.
        assert_eq!(report.stored, 2);
        assert!(repo.get("tx-a").is_some());
        assert!(repo.get("tx-b").is_some());
        assert!(repo.get("tx-bad").is_none());
    }
}
