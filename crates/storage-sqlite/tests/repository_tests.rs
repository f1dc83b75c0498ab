//! Integration tests for the SQLite repositories, run against a real
//! on-disk database with migrations applied.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use tempfile::TempDir;

use cardsync_core::cards::{CardRepositoryTrait, NewCard};
use cardsync_core::connections::{ConnectionRepositoryTrait, NewConnection};
use cardsync_core::cycles::{BillingCycle, BillingCycleRepositoryTrait, PaymentStatus};
use cardsync_core::sync::SyncLeaseRepositoryTrait;
use cardsync_core::transactions::{CardTransaction, TransactionRepositoryTrait};
use cardsync_storage_sqlite::cards::CardRepository;
use cardsync_storage_sqlite::connections::ConnectionRepository;
use cardsync_storage_sqlite::cycles::BillingCycleRepository;
use cardsync_storage_sqlite::leases::SyncLeaseRepository;
use cardsync_storage_sqlite::transactions::TransactionRepository;
use cardsync_storage_sqlite::{init, spawn_writer, DbPool, WriteHandle};

struct Fixture {
    pool: Arc<DbPool>,
    writer: WriteHandle,
    // Held so the database file outlives the fixture
    _dir: TempDir,
}

fn setup() -> Fixture {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cardsync-test.db");
    let pool = init(db_path.to_str().unwrap()).unwrap();
    let writer = spawn_writer(pool.clone());
    Fixture {
        pool,
        writer,
        _dir: dir,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed_connection(fixture: &Fixture) -> String {
    let repo = ConnectionRepository::new(fixture.pool.clone(), fixture.writer.clone());
    let connection = repo
        .create(NewConnection {
            item_id: format!("item-{}", uuid::Uuid::new_v4()),
            access_token: "token".to_string(),
            institution_id: Some("ins_1".to_string()),
            institution_name: Some("Test Bank".to_string()),
        })
        .await
        .unwrap();
    connection.id
}

async fn seed_card(fixture: &Fixture, connection_id: &str, external: &str) -> String {
    let repo = CardRepository::new(fixture.pool.clone(), fixture.writer.clone());
    let card = repo
        .create(NewCard {
            connection_id: connection_id.to_string(),
            external_account_id: external.to_string(),
            name: "Test Card".to_string(),
            mask: Some("4321".to_string()),
            current_balance: Some(dec!(100)),
            available_balance: Some(dec!(900)),
            credit_limit: Some(dec!(1000)),
            last_statement_balance: None,
            last_statement_date: None,
            next_payment_due_date: None,
            minimum_payment: None,
            open_date: Some(date(2024, 1, 15)),
        })
        .await
        .unwrap();
    card.id
}

fn transaction(
    external_id: &str,
    card_id: Option<&str>,
    connection_id: &str,
    amount: rust_decimal::Decimal,
    tx_date: NaiveDate,
) -> CardTransaction {
    let now = Utc::now();
    CardTransaction {
        external_id: external_id.to_string(),
        card_id: card_id.map(str::to_string),
        connection_id: connection_id.to_string(),
        amount,
        date: tx_date,
        name: Some("Coffee".to_string()),
        merchant_name: None,
        category_primary: Some("FOOD_AND_DRINK".to_string()),
        category_detailed: None,
        pending: false,
        needs_review: false,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_connection_round_trip() {
    let fixture = setup();
    let repo = ConnectionRepository::new(fixture.pool.clone(), fixture.writer.clone());

    let created = repo
        .create(NewConnection {
            item_id: "item-rt".to_string(),
            access_token: "secret".to_string(),
            institution_id: None,
            institution_name: Some("Chase".to_string()),
        })
        .await
        .unwrap();

    let by_item = repo.get_by_item_id("item-rt").unwrap().unwrap();
    assert_eq!(by_item.id, created.id);
    assert_eq!(by_item.institution_name.as_deref(), Some("Chase"));

    repo.mark_synced(&created.id, Utc::now()).await.unwrap();
    let refreshed = repo.get_by_id(&created.id).unwrap();
    assert!(refreshed.last_synced_at.is_some());
}

#[tokio::test]
async fn test_transaction_upsert_is_idempotent() {
    let fixture = setup();
    let connection_id = seed_connection(&fixture).await;
    let card_id = seed_card(&fixture, &connection_id, "ext-1").await;
    let repo = TransactionRepository::new(fixture.pool.clone(), fixture.writer.clone());

    let first = transaction("tx-1", Some(&card_id), &connection_id, dec!(12.50), date(2025, 6, 1));
    repo.upsert_batch(vec![first]).await.unwrap();

    let mut second = transaction("tx-1", Some(&card_id), &connection_id, dec!(13.00), date(2025, 6, 1));
    second.merchant_name = Some("Blue Bottle".to_string());
    repo.upsert_batch(vec![second]).await.unwrap();

    let rows = repo.list_by_card(&card_id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, dec!(13.00));
    assert_eq!(rows[0].merchant_name.as_deref(), Some("Blue Bottle"));
}

#[tokio::test]
async fn test_out_of_window_transactions_survive_later_syncs() {
    let fixture = setup();
    let connection_id = seed_connection(&fixture).await;
    let card_id = seed_card(&fixture, &connection_id, "ext-1").await;
    let repo = TransactionRepository::new(fixture.pool.clone(), fixture.writer.clone());

    repo.upsert_batch(vec![transaction(
        "tx-old",
        Some(&card_id),
        &connection_id,
        dec!(10),
        date(2025, 1, 5),
    )])
    .await
    .unwrap();

    // A later, narrower sync writes only a recent transaction.
    repo.upsert_batch(vec![transaction(
        "tx-new",
        Some(&card_id),
        &connection_id,
        dec!(20),
        date(2025, 6, 5),
    )])
    .await
    .unwrap();

    assert_eq!(repo.count_for_card(&card_id).unwrap(), 2);
    assert!(repo.get_by_external_id("tx-old").unwrap().is_some());
    assert_eq!(
        repo.count_older_than(&connection_id, date(2025, 6, 1)).unwrap(),
        1
    );
    assert_eq!(
        repo.earliest_date_for_card(&card_id).unwrap(),
        Some(date(2025, 1, 5))
    );
}

#[tokio::test]
async fn test_merge_into_repoints_transactions_and_drops_duplicate() {
    let fixture = setup();
    let connection_id = seed_connection(&fixture).await;
    let keep = seed_card(&fixture, &connection_id, "ext-dup").await;
    let dup = seed_card(&fixture, &connection_id, "ext-dup").await;

    let card_repo = CardRepository::new(fixture.pool.clone(), fixture.writer.clone());
    let tx_repo = TransactionRepository::new(fixture.pool.clone(), fixture.writer.clone());

    tx_repo
        .upsert_batch(vec![transaction(
            "tx-on-dup",
            Some(&dup),
            &connection_id,
            dec!(55),
            date(2025, 5, 1),
        )])
        .await
        .unwrap();

    card_repo.merge_into(&dup, &keep).await.unwrap();

    let remaining = card_repo.get_by_external_id("ext-dup").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);

    let moved = tx_repo.get_by_external_id("tx-on-dup").unwrap().unwrap();
    assert_eq!(moved.card_id.as_deref(), Some(keep.as_str()));
}

#[tokio::test]
async fn test_cycle_replace_for_card() {
    let fixture = setup();
    let connection_id = seed_connection(&fixture).await;
    let card_id = seed_card(&fixture, &connection_id, "ext-1").await;
    let repo = BillingCycleRepository::new(fixture.pool.clone(), fixture.writer.clone());

    let now = Utc::now();
    let cycle = |id: &str, start: NaiveDate| BillingCycle {
        id: id.to_string(),
        card_id: card_id.clone(),
        start_date: start,
        end_date: start + chrono::Days::new(29),
        total_spend: dec!(321.09),
        transaction_count: 12,
        statement_balance: None,
        minimum_payment: None,
        due_date: None,
        payment_status: PaymentStatus::Current,
        created_at: now,
        updated_at: now,
    };

    repo.replace_for_card(&card_id, vec![cycle("cyc-1", date(2025, 4, 15))])
        .await
        .unwrap();
    repo.replace_for_card(
        &card_id,
        vec![cycle("cyc-2", date(2025, 5, 15)), cycle("cyc-3", date(2025, 6, 14))],
    )
    .await
    .unwrap();

    let cycles = repo.list_by_card(&card_id).unwrap();
    assert_eq!(cycles.len(), 2);
    assert!(cycles.iter().all(|c| c.id != "cyc-1"));
}

#[tokio::test]
async fn test_lease_excludes_second_holder_until_released() {
    let fixture = setup();
    let connection_id = seed_connection(&fixture).await;
    let repo = SyncLeaseRepository::new(fixture.pool.clone(), fixture.writer.clone());

    let held = repo.try_acquire(&connection_id, "sync-a").await.unwrap();
    assert!(held.is_some());

    let contested = repo.try_acquire(&connection_id, "sync-b").await.unwrap();
    assert!(contested.is_none());

    // Re-entrant acquire by the same holder refreshes the lease.
    let refreshed = repo.try_acquire(&connection_id, "sync-a").await.unwrap();
    assert!(refreshed.is_some());

    repo.release(&connection_id, "sync-a").await.unwrap();
    let after_release = repo.try_acquire(&connection_id, "sync-b").await.unwrap();
    assert!(after_release.is_some());
}

#[tokio::test]
async fn test_releasing_someone_elses_lease_is_a_noop() {
    let fixture = setup();
    let connection_id = seed_connection(&fixture).await;
    let repo = SyncLeaseRepository::new(fixture.pool.clone(), fixture.writer.clone());

    repo.try_acquire(&connection_id, "sync-a").await.unwrap();
    repo.release(&connection_id, "sync-b").await.unwrap();

    assert!(repo.get(&connection_id).unwrap().is_some());
    assert!(repo
        .try_acquire(&connection_id, "sync-b")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_batch_rolls_back_atomically_on_failure() {
    let fixture = setup();
    let connection_id = seed_connection(&fixture).await;
    let card_id = seed_card(&fixture, &connection_id, "ext-1").await;
    let repo = TransactionRepository::new(fixture.pool.clone(), fixture.writer.clone());

    // Second row violates the cards foreign key, so the whole batch must
    // roll back — that is what triggers the accumulator's per-record path.
    let good = transaction("tx-good", Some(&card_id), &connection_id, dec!(5), date(2025, 6, 1));
    let bad = transaction(
        "tx-bad",
        Some("card-does-not-exist"),
        &connection_id,
        dec!(6),
        date(2025, 6, 2),
    );

    let result = repo.upsert_batch(vec![good, bad]).await;
    assert!(result.is_err());
    assert!(repo.get_by_external_id("tx-good").unwrap().is_none());

    // The per-record fallback stores what it can.
    repo.upsert_single(transaction(
        "tx-good",
        Some(&card_id),
        &connection_id,
        dec!(5),
        date(2025, 6, 1),
    ))
    .await
    .unwrap();
    assert!(repo.get_by_external_id("tx-good").unwrap().is_some());
}
