mod common;

use bazaar::application::settlement::CreateOrderRequest;
use bazaar::domain::identity::Actor;
use bazaar::domain::order::OrderStatus;
use bazaar::domain::ports::{InventoryStore, OrderStore};
use bazaar::error::SettlementError;
use common::{harness, variant};
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn test_concurrent_reservations_never_oversell() {
    let h = harness();
    h.seed_variant(variant("HOT-1", 10, 5, dec!(9.99))).await;

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let inventory = Arc::clone(&h.inventory);
        tasks.push(tokio::spawn(
            async move { inventory.reserve("HOT-1", 1).await },
        ));
    }

    let mut successes = 0;
    let mut rejections = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(SettlementError::OutOfStock { .. }) => rejections += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 5);
    assert_eq!(rejections, 5);
    let v = h.inventory.get_variant("HOT-1").await.unwrap().unwrap();
    assert_eq!(v.available, 0);
    assert_eq!(v.sold, 5);

    h.shutdown().await;
}

#[tokio::test]
async fn test_reservations_on_distinct_skus_do_not_block_each_other() {
    let h = harness();
    h.seed_variant(variant("A-1", 10, 100, dec!(1.0))).await;
    h.seed_variant(variant("B-1", 20, 100, dec!(1.0))).await;

    let mut tasks = Vec::new();
    for sku in ["A-1", "B-1"] {
        for _ in 0..50 {
            let inventory = Arc::clone(&h.inventory);
            tasks.push(tokio::spawn(async move { inventory.reserve(sku, 1).await }));
        }
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    for sku in ["A-1", "B-1"] {
        let v = h.inventory.get_variant(sku).await.unwrap().unwrap();
        assert_eq!(v.available, 50);
        assert_eq!(v.sold, 50);
    }

    h.shutdown().await;
}

#[tokio::test]
async fn test_racing_status_writers_conflict_on_the_same_version() {
    let h = harness();
    let alice = Actor::buyer(1, "alice");
    h.seed_variant(variant("SKU-1", 10, 5, dec!(25.0))).await;
    h.seed_cart(&alice, &[("SKU-1", 1)]).await;
    h.seed_address(&alice).await;
    let order = h
        .engine
        .create_order(CreateOrderRequest::default(), &alice)
        .await
        .unwrap()
        .remove(0);

    // Two writers read the same snapshot and race to commit.
    let mut first = order.clone();
    first.status = OrderStatus::Confirmed;
    let mut second = order.clone();
    second.status = OrderStatus::Processing;

    let (a, b) = tokio::join!(
        h.orders.update_versioned(first, order.version),
        h.orders.update_versioned(second, order.version),
    );

    let outcomes = [a, b];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(SettlementError::ConcurrencyConflict)))
        .count();
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 1);

    // The committed state is the winner's, at the bumped version.
    let stored = h.orders.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored.version, order.version + 1);
    assert_ne!(stored.status, OrderStatus::Pending);

    h.shutdown().await;
}

#[tokio::test]
async fn test_stale_engine_writer_must_re_read() {
    let h = harness();
    let alice = Actor::buyer(1, "alice");
    let seller = Actor::seller(10, "bob");
    h.seed_variant(variant("SKU-1", 10, 5, dec!(25.0))).await;
    h.seed_cart(&alice, &[("SKU-1", 1)]).await;
    h.seed_address(&alice).await;
    let order = h
        .engine
        .create_order(CreateOrderRequest::default(), &alice)
        .await
        .unwrap()
        .remove(0);

    // A writer who committed through the store already advanced the version.
    let mut behind_the_back = order.clone();
    behind_the_back.status = OrderStatus::Confirmed;
    h.orders
        .update_versioned(behind_the_back, order.version)
        .await
        .unwrap();

    // The engine re-reads before writing, so it sees the new version and
    // succeeds; the stale snapshot itself can no longer be committed.
    let stale_commit = h
        .orders
        .update_versioned(order.clone(), order.version)
        .await;
    assert!(matches!(
        stale_commit,
        Err(SettlementError::ConcurrencyConflict)
    ));

    let updated = h
        .engine
        .update_status(order.external_id, "PROCESSING", &seller)
        .await
        .unwrap();
    assert_eq!(updated.version, order.version + 2);

    h.shutdown().await;
}

#[tokio::test]
async fn test_cancel_loses_to_a_faster_status_writer() {
    let h = harness();
    let alice = Actor::buyer(1, "alice");
    h.seed_variant(variant("SKU-1", 10, 5, dec!(25.0))).await;
    h.seed_cart(&alice, &[("SKU-1", 2)]).await;
    h.seed_address(&alice).await;
    let order = h
        .engine
        .create_order(CreateOrderRequest::default(), &alice)
        .await
        .unwrap()
        .remove(0);

    // A concurrent writer moves the order to a non-cancellable status after
    // the canceller read it but before it commits: the version guard turns
    // the cancel into a conflict, and no restock happens.
    let mut shipped = order.clone();
    shipped.status = OrderStatus::Processing;
    h.orders
        .update_versioned(shipped, order.version)
        .await
        .unwrap();

    let err = h.engine.cancel(order.external_id, &alice).await.unwrap_err();
    assert!(matches!(err, SettlementError::CancellationNotAllowed));

    let v = h.inventory.get_variant("SKU-1").await.unwrap().unwrap();
    assert_eq!(v.available, 3);
    assert_eq!(v.sold, 2);

    h.shutdown().await;
}
