// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use wallet_flow::{
  ContextData, DeliveryError, FlowError, FulfillmentOrchestrator, LineItem, MemoryLedgerStore, Notification,
  NotificationSink, OrchestratorConfig, Order, PipelineControl, Seller,
};

// --- Engine fixtures ---

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Flow engine error: {0}")]
  Flow(String), // FlowError is not PartialEq; keep its Debug text.

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(format!("{:?}", err))
  }
}

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> wallet_flow::flow::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    let step_name_owned = step_name.to_string();
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name_owned.clone());
      tracing::debug!(target: "test_handlers", step = %step_name_owned, "executed, counter: {}", guard.counter);
      if guard.should_stop_at.as_deref() == Some(step_name_owned.as_str()) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> wallet_flow::flow::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    let step_name_owned = step_name.to_string();
    let error_message_owned = error_message.to_string();
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name_owned.clone());
      Err(TestError::Handler(error_message_owned))
    })
  })
}

// --- Tracing ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Ledger fixtures ---

pub const ORDER_ID: &str = "ord-7f3a9c21e4b8";
pub const SELLER_ID: &str = "seller-1";
pub const ADMIN: &str = "admin-1";

pub fn item(name: &str, price: Decimal, quantity: i64) -> LineItem {
  LineItem {
    name: name.to_string(),
    price,
    quantity,
    image_url: None,
  }
}

/// Two units at 10.00 and one at 5.00: price 25.00, margin 5.75.
pub fn scenario_items() -> Vec<LineItem> {
  vec![item("mug", dec!(10.00), 2), item("coaster", dec!(5.00), 1)]
}

pub fn assigned_order(id: &str, order_number: Option<&str>, items: Vec<LineItem>) -> Order {
  Order::assigned(id, order_number.map(str::to_string), items, dec!(4.99), ADMIN, Utc::now())
}

/// A store holding the scenario order and a seller with `balance` in their wallet.
pub fn scenario_store(balance: Decimal) -> Arc<MemoryLedgerStore> {
  let store = Arc::new(MemoryLedgerStore::new());
  store.insert_order(assigned_order(ORDER_ID, Some("1042"), scenario_items()));
  store.insert_seller(Seller::new(SELLER_ID, balance, Utc::now()));
  store
}

pub fn orchestrator(store: &Arc<MemoryLedgerStore>) -> FulfillmentOrchestrator {
  FulfillmentOrchestrator::new(store.clone(), OrchestratorConfig::default())
}

pub fn orchestrator_with_timeout(store: &Arc<MemoryLedgerStore>, timeout: Duration) -> FulfillmentOrchestrator {
  FulfillmentOrchestrator::new(store.clone(), OrchestratorConfig::with_store_timeout(timeout))
}

pub fn orchestrator_with_sink(store: &Arc<MemoryLedgerStore>, sink: Arc<dyn NotificationSink>) -> FulfillmentOrchestrator {
  FulfillmentOrchestrator::with_notification_sink(store.clone(), sink, OrchestratorConfig::default())
}

/// Keeps every delivered notification.
#[derive(Default)]
pub struct RecordingSink {
  pub delivered: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
  async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
    self.delivered.lock().push(notification.clone());
    Ok(())
  }
}

/// Rejects every delivery.
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
  async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
    Err(DeliveryError {
      notification_id: notification.id.to_string(),
      reason: "admin inbox unreachable".to_string(),
    })
  }
}
