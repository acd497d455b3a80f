// tests/store_failure_tests.rs
mod common;

use common::*;
use chrono::Utc;
use rust_decimal_macros::dec;
use std::time::Duration;
use wallet_flow::{FulfillmentError, LedgerStore, OrderStatus, Seller, MAX_LEDGER_AMOUNT};

#[tokio::test]
async fn test_offline_store_is_retryable_and_writes_nothing() {
  setup_tracing();
  let store = scenario_store(dec!(100));
  store.set_unavailable(true);

  let err = orchestrator(&store).pick_order(ORDER_ID, SELLER_ID, SELLER_ID).await.unwrap_err();

  assert!(matches!(err, FulfillmentError::StoreUnavailable { operation: "get_order", .. }));
  assert!(err.is_retryable());
  store.set_unavailable(false);
  assert_eq!(store.get_order(ORDER_ID).await.unwrap().unwrap().status, OrderStatus::Assigned);
  assert!(store.transaction_log().is_empty());
}

#[tokio::test]
async fn test_slow_store_times_out_as_unavailable() {
  setup_tracing();
  let store = scenario_store(dec!(100));
  store.set_latency(Some(Duration::from_millis(200)));

  let err = orchestrator_with_timeout(&store, Duration::from_millis(20))
    .advance_status(ORDER_ID, SELLER_ID, OrderStatus::Processing)
    .await
    .unwrap_err();

  assert!(matches!(err, FulfillmentError::StoreUnavailable { .. }));
  assert_eq!(err.code(), "StoreUnavailable");
}

#[tokio::test]
async fn test_timed_out_commit_still_lands_and_retry_is_rejected() {
  setup_tracing();
  let store = scenario_store(dec!(100));
  let orchestrator = orchestrator_with_timeout(&store, Duration::from_millis(50));
  store.set_commit_latency(Some(Duration::from_millis(150)));

  let err = orchestrator.pick_order(ORDER_ID, SELLER_ID, SELLER_ID).await.unwrap_err();
  assert!(matches!(err, FulfillmentError::StoreUnavailable { operation: "commit_pick", .. }));

  // The abandoned commit completes on its own task.
  tokio::time::sleep(Duration::from_millis(300)).await;
  store.set_commit_latency(None);
  assert_eq!(store.get_order(ORDER_ID).await.unwrap().unwrap().status, OrderStatus::Picked);
  assert_eq!(store.transaction_log().len(), 1);

  let retry = orchestrator.pick_order(ORDER_ID, SELLER_ID, SELLER_ID).await.unwrap_err();
  assert!(matches!(retry, FulfillmentError::InvalidTransition { .. }));
  assert_eq!(store.transaction_log().len(), 1);
}

#[tokio::test]
async fn test_escrow_past_the_ledger_limit_is_rejected_for_good() {
  setup_tracing();
  let store = scenario_store(dec!(100));
  let mut seller = Seller::new(SELLER_ID, dec!(100), Utc::now());
  seller.pending_amount = MAX_LEDGER_AMOUNT - dec!(10.00);
  store.insert_seller(seller);

  let err = orchestrator(&store).pick_order(ORDER_ID, SELLER_ID, SELLER_ID).await.unwrap_err();

  assert!(matches!(err, FulfillmentError::StoreRejected { .. }));
  assert!(!err.is_retryable());
  assert_eq!(store.get_order(ORDER_ID).await.unwrap().unwrap().status, OrderStatus::Assigned);
  let seller = store.get_seller(SELLER_ID).await.unwrap().unwrap();
  assert_eq!(seller.wallet_balance, dec!(100));
  assert_eq!(seller.pending_amount, MAX_LEDGER_AMOUNT - dec!(10.00));
  assert!(store.transaction_log().is_empty());
}
