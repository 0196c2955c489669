//! PostgresRelayStore against a real database.
//!
//! Needs a Docker daemon: `cargo test --test postgres_store_tests -- --ignored`

mod common;

use common::*;
use relay_core::common::{HolderId, NormalizedNumber};
use relay_core::domains::assignments::Assignment;
use relay_core::domains::cooldown::CooldownGate;
use relay_core::domains::ledger::{DebitOutcome, WithdrawalMethod, WithdrawalPolicy};
use relay_core::kernel::{IssueOutcome, RelayEngine, RelayStore, WithdrawalRecord};
use relay_core::kernel::test_dependencies::RecordingNotifier;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use test_context::test_context;

fn gate() -> CooldownGate {
    CooldownGate::new(chrono::Duration::seconds(15))
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn issue_moves_number_from_pool_to_assignment(ctx: &TestHarness) {
    let store = ctx.store();
    store.add_numbers(&numbers(&["+1 555-0100"])).await.unwrap();

    let issued = expect_issued(store.issue(HolderId(1), t0(), &gate()).await.unwrap());

    assert_eq!(issued.raw_value, "+1 555-0100");
    assert_eq!(store.stock_count().await.unwrap(), 0);
    assert_eq!(
        store.resolve(&NormalizedNumber::from_raw("15550100")).await.unwrap(),
        Some(HolderId(1))
    );
    assert_eq!(
        store.issue(HolderId(1), t0(), &gate()).await.unwrap(),
        IssueOutcome::Denied { seconds_remaining: 15 }
    );
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn add_numbers_rejects_duplicates(ctx: &TestHarness) {
    let store = ctx.store();

    let added = store
        .add_numbers(&numbers(&["5550100200", " 5550100200", "abc", "5550100300"]))
        .await
        .unwrap();

    assert_eq!(added, 2);
    assert!(store.remove_number("5550100300").await.unwrap());
    assert!(!store.remove_number("5550100300").await.unwrap());
    assert_eq!(store.clear_numbers().await.unwrap(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn supersede_keeps_one_assignment_per_holder(ctx: &TestHarness) {
    let store = ctx.store();
    store
        .add_numbers(&numbers(&["5550100200", "5550100300"]))
        .await
        .unwrap();

    let first = expect_issued(store.issue(HolderId(1), t0(), &gate()).await.unwrap());
    let later = t0() + chrono::Duration::seconds(20);
    let second = expect_issued(store.issue(HolderId(1), later, &gate()).await.unwrap());

    assert_eq!(second.superseded, Some(first.normalized.clone()));
    assert_eq!(store.assignment_count().await.unwrap(), 1);
    assert_eq!(store.resolve(&first.normalized).await.unwrap(), None);
}

#[test_context(TestHarness)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires docker"]
async fn racing_assignments_of_one_number_last_writer_wins(ctx: &TestHarness) {
    let number = NormalizedNumber::from_raw("+1 555-0100");

    let mut first = ctx.db_pool.begin().await.unwrap();
    Assignment::assign(&number, HolderId(1), t0(), &mut first)
        .await
        .unwrap();

    // Second writer starts before the first commits and waits on its key
    let pool = ctx.db_pool.clone();
    let racing_number = number.clone();
    let second = tokio::spawn(async move {
        let mut tx = pool.begin().await?;
        Assignment::assign(&racing_number, HolderId(2), t0(), &mut tx).await?;
        tx.commit().await?;
        Ok::<_, relay_core::common::RelayError>(())
    });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    first.commit().await.unwrap();

    second.await.unwrap().unwrap();

    let store = ctx.store();
    assert_eq!(store.resolve(&number).await.unwrap(), Some(HolderId(2)));
    assert_eq!(store.assignment_count().await.unwrap(), 1);
}

#[test_context(TestHarness)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires docker"]
async fn concurrent_issuance_hands_out_each_number_once(ctx: &TestHarness) {
    let store = Arc::new(ctx.store());
    let stock: Vec<String> = (0..5).map(|i| format!("55501002{:02}", i)).collect();
    store.add_numbers(&stock).await.unwrap();

    let handles: Vec<_> = (0..20)
        .map(|holder| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.issue(HolderId(holder), t0(), &gate()).await })
        })
        .collect();

    let mut issued = Vec::new();
    for handle in handles {
        if let IssueOutcome::Issued(number) = handle.await.unwrap().unwrap() {
            issued.push(number.raw_value);
        }
    }

    // SKIP LOCKED may report a locked row as missing, so fewer than five is legal
    assert!(issued.len() <= 5);
    let distinct: HashSet<_> = issued.iter().collect();
    assert_eq!(distinct.len(), issued.len());
    assert_eq!(
        store.stock_count().await.unwrap() + issued.len() as i64,
        5
    );
    assert_eq!(store.assignment_count().await.unwrap(), issued.len() as i64);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn settle_match_credits_once(ctx: &TestHarness) {
    let store = ctx.store();
    store.register_holder(HolderId(1)).await.unwrap();
    store.add_numbers(&numbers(&["5550100200"])).await.unwrap();
    let issued = expect_issued(store.issue(HolderId(1), t0(), &gate()).await.unwrap());
    let credit = Decimal::new(60, 2);

    assert!(store.settle_match(&issued.normalized, HolderId(1), credit).await.unwrap());
    assert!(!store.settle_match(&issued.normalized, HolderId(1), credit).await.unwrap());

    assert_eq!(store.balance(HolderId(1)).await.unwrap(), credit);
    assert_eq!(store.assignment_count().await.unwrap(), 0);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn guarded_debit_leaves_balance_on_refusal(ctx: &TestHarness) {
    let store = ctx.store();
    store.register_holder(HolderId(1)).await.unwrap();

    let refused = store
        .debit_if_sufficient(HolderId(1), Decimal::new(100, 2))
        .await
        .unwrap();
    assert_eq!(refused, DebitOutcome::InsufficientBalance { balance: Decimal::ZERO });

    store.add_numbers(&numbers(&["5550100200"])).await.unwrap();
    let issued = expect_issued(store.issue(HolderId(1), t0(), &gate()).await.unwrap());
    store
        .settle_match(&issued.normalized, HolderId(1), Decimal::new(60, 2))
        .await
        .unwrap();

    let debited = store
        .debit_if_sufficient(HolderId(1), Decimal::new(50, 2))
        .await
        .unwrap();
    assert_eq!(debited, DebitOutcome::Debited { balance: Decimal::new(10, 2) });
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn withdrawal_records_intent_and_debits(ctx: &TestHarness) {
    let store = ctx.store();
    store.register_holder(HolderId(1)).await.unwrap();
    let policy = WithdrawalPolicy::default();
    let quote = policy
        .quote(WithdrawalMethod::Recharge, Decimal::new(20, 0))
        .unwrap();

    let refused = store.record_withdrawal(HolderId(1), &quote, "01711000000").await.unwrap();
    assert!(matches!(refused, WithdrawalRecord::InsufficientBalance { .. }));

    store.add_numbers(&numbers(&["5550100200"])).await.unwrap();
    let issued = expect_issued(store.issue(HolderId(1), t0(), &gate()).await.unwrap());
    store
        .settle_match(&issued.normalized, HolderId(1), Decimal::new(25, 0))
        .await
        .unwrap();

    let recorded = store.record_withdrawal(HolderId(1), &quote, "01711000000").await.unwrap();
    let WithdrawalRecord::Recorded { intent, balance } = recorded else {
        panic!("expected a recorded withdrawal, got {:?}", recorded);
    };
    assert_eq!(balance, Decimal::new(5, 0));
    assert_eq!(intent.method, "recharge");
    assert_eq!(store.withdrawals(HolderId(1)).await.unwrap().len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn engine_runs_end_to_end_on_postgres(ctx: &TestHarness) {
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = RelayEngine::new(Arc::new(ctx.store()), notifier.clone(), quiet_settings())
        .unwrap();
    engine.add_numbers(&numbers(&["+1 555-0100"])).await.unwrap();

    expect_issued(engine.request_number_at(HolderId(1), t0()).await.unwrap());
    let events = engine
        .on_channel_message("code 123456 for 15550100")
        .await
        .unwrap();
    for event in &events {
        engine.deliver(event).await;
    }

    assert_eq!(events.len(), 1);
    assert_eq!(engine.get_balance(HolderId(1)).await.unwrap(), Decimal::new(60, 2));
    assert_eq!(notifier.messages_for(HolderId(1)).len(), 1);
    assert_eq!(engine.holders().await.unwrap(), vec![HolderId(1)]);
}
