//! The two ingestion tasks driving a shared engine.

mod common;

use common::*;
use relay_core::common::HolderId;
use relay_core::kernel::{
    spawn_channel_ingest, spawn_request_ingest, IssueOutcome, NumberRequest, TestDependencies,
};
use rust_decimal::Decimal;
use tokio::sync::mpsc;

#[tokio::test]
async fn request_ingest_replies_on_oneshot() {
    let deps = TestDependencies::with_settings(quiet_settings());
    deps.engine.add_numbers(&numbers(&["5550100200"])).await.unwrap();

    let (tx, rx) = mpsc::channel(8);
    let ingest = spawn_request_ingest(deps.engine.clone(), rx);

    let (first, first_reply) = NumberRequest::new(HolderId(1));
    let (second, second_reply) = NumberRequest::new(HolderId(2));
    tx.send(first).await.unwrap();
    tx.send(second).await.unwrap();

    let outcomes = [
        first_reply.await.unwrap().unwrap(),
        second_reply.await.unwrap().unwrap(),
    ];
    let issued = outcomes
        .iter()
        .filter(|o| matches!(o, IssueOutcome::Issued(_)))
        .count();
    let out_of_stock = outcomes
        .iter()
        .filter(|o| matches!(o, IssueOutcome::OutOfStock))
        .count();
    assert_eq!((issued, out_of_stock), (1, 1));

    drop(tx);
    ingest.await.unwrap();
}

#[tokio::test]
async fn channel_ingest_routes_and_delivers_in_order() {
    let deps = TestDependencies::with_settings(quiet_settings());
    deps.engine.add_numbers(&numbers(&["5550100200"])).await.unwrap();
    expect_issued(deps.engine.request_number(HolderId(4)).await.unwrap());

    let (tx, rx) = mpsc::channel(8);
    let ingest = spawn_channel_ingest(deps.engine.clone(), rx);

    tx.send("code 1111 for 5550100200".to_string()).await.unwrap();
    tx.send("code 2222 for 5550100200".to_string()).await.unwrap();
    tx.send("no numbers here".to_string()).await.unwrap();
    drop(tx);

    ingest.await.unwrap().unwrap();

    let sent = deps.notifier.messages_for(HolderId(4));
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("code 1111"));
    assert_eq!(deps.engine.get_balance(HolderId(4)).await.unwrap(), Decimal::new(60, 2));
}
