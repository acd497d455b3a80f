// wallet_flow/src/orchestrator/mod.rs

//! The seller-facing fulfillment operations.
//!
//! Each operation is a named-step pipeline registered with a [`FlowRegistry`]
//! under its context type. Reads happen up front so the common failures are
//! reported without taking locks; the final commit re-validates everything
//! against the locked records.

mod advance_flow;
mod common_steps;
pub mod contexts;
mod pick_flow;

use crate::config::OrchestratorConfig;
use crate::error::{FulfillmentError, FulfillmentResult};
use crate::flow::{ContextData, FlowRegistry, PipelineResult};
use crate::model::{LedgerTransaction, Notification, Order, OrderStatus};
use crate::notify::{NotificationSink, TracingNotificationSink};
use crate::store::{Committed, LedgerStore};
use common_steps::{bounded, fetch_order};
use contexts::{AdvanceCtxData, FlowDeps, PickCtxData};
use std::sync::Arc;
use tracing::instrument;

/// An order with its audit trail.
#[derive(Debug, Clone)]
pub struct OrderTrail {
  pub order: Order,
  pub transactions: Vec<LedgerTransaction>,
  pub notifications: Vec<Notification>,
}

pub struct FulfillmentOrchestrator {
  registry: FlowRegistry<FulfillmentError>,
  deps: FlowDeps,
}

impl FulfillmentOrchestrator {
  /// An orchestrator that delivers committed notifications as tracing events.
  pub fn new(store: Arc<dyn LedgerStore>, config: OrchestratorConfig) -> Self {
    Self::build(store, Arc::new(TracingNotificationSink), config)
  }

  /// An orchestrator that also hands every committed notification to `sink`.
  pub fn with_notification_sink(
    store: Arc<dyn LedgerStore>,
    sink: Arc<dyn NotificationSink>,
    config: OrchestratorConfig,
  ) -> Self {
    Self::build(store, sink, config)
  }

  fn build(store: Arc<dyn LedgerStore>, sink: Arc<dyn NotificationSink>, config: OrchestratorConfig) -> Self {
    let registry = FlowRegistry::<FulfillmentError>::new();
    registry.register_pipeline(pick_flow::pick_pipeline());
    registry.register_pipeline(advance_flow::advance_pipeline(sink));
    Self {
      registry,
      deps: FlowDeps { store, config },
    }
  }

  /// Seller `seller_id` picks `order_id`, reserving its funds.
  ///
  /// On success the order is `picked`, the seller's wallet is debited by the
  /// product price, escrow grows by price plus margin, and one `order_picked`
  /// transaction is recorded, all in one commit. On any error nothing is
  /// written.
  #[instrument(name = "FulfillmentOrchestrator::pick_order", skip(self), err(Display))]
  pub async fn pick_order(&self, order_id: &str, seller_id: &str, actor: &str) -> FulfillmentResult<Order> {
    let ctx_data = ContextData::new(PickCtxData::new(self.deps.clone(), order_id, seller_id, actor));
    let outcome = self.registry.run(ctx_data.clone()).await?;
    let committed = ctx_data.read().committed.clone();
    committed_order("pick", outcome, committed)
  }

  /// Moves `order_id` to `requested` on behalf of `actor`.
  ///
  /// Requesting `completed` persists `completion_requested` and raises a
  /// high-priority admin notification in the same commit.
  #[instrument(name = "FulfillmentOrchestrator::advance_status", skip(self), err(Display))]
  pub async fn advance_status(&self, order_id: &str, actor: &str, requested: OrderStatus) -> FulfillmentResult<Order> {
    let ctx_data = ContextData::new(AdvanceCtxData::new(self.deps.clone(), order_id, actor, requested));
    let outcome = self.registry.run(ctx_data.clone()).await?;
    let committed = ctx_data.read().committed.clone();
    committed_order("advance", outcome, committed)
  }

  /// Read-only view of an order and every ledger record written for it.
  #[instrument(name = "FulfillmentOrchestrator::order_trail", skip(self), err(Display))]
  pub async fn order_trail(&self, order_id: &str) -> FulfillmentResult<OrderTrail> {
    let limit = self.deps.config.store_timeout;
    let order = fetch_order(&self.deps, order_id).await?;
    let transactions = bounded(
      "transactions_for_order",
      limit,
      self.deps.store.transactions_for_order(order_id),
    )
    .await?;
    let notifications = bounded(
      "notifications_for_order",
      limit,
      self.deps.store.notifications_for_order(order_id),
    )
    .await?;
    Ok(OrderTrail {
      order,
      transactions,
      notifications,
    })
  }
}

fn committed_order(
  operation: &str,
  outcome: PipelineResult,
  committed: Option<Committed>,
) -> FulfillmentResult<Order> {
  match (outcome, committed) {
    (PipelineResult::Completed, Some(committed)) => Ok(committed.order),
    (outcome, _) => Err(FulfillmentError::Flow(format!(
      "{} pipeline finished as {:?} without a commit",
      operation, outcome
    ))),
  }
}
