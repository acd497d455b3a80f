// wallet_flow/src/orchestrator/contexts.rs

//! Context data for the fulfillment pipelines. Handlers receive these wrapped
//! in `ContextData`.

use crate::config::OrchestratorConfig;
use crate::model::{Order, OrderStatus, Seller};
use crate::settlement::FundsQuote;
use crate::store::{Committed, LedgerStore};
use std::sync::Arc;

/// What every step needs to reach the outside world.
#[derive(Clone)]
pub struct FlowDeps {
  pub store: Arc<dyn LedgerStore>,
  pub config: OrchestratorConfig,
}

#[derive(Clone)]
pub struct PickCtxData {
  pub deps: FlowDeps,
  pub order_id: String,
  pub seller_id: String,
  pub actor: String,
  pub order: Option<Order>,
  pub seller: Option<Seller>,
  /// Preview computed before the commit; the commit re-prices against the
  /// locked seller.
  pub quote: Option<FundsQuote>,
  pub committed: Option<Committed>,
}

impl PickCtxData {
  pub fn new(deps: FlowDeps, order_id: &str, seller_id: &str, actor: &str) -> Self {
    Self {
      deps,
      order_id: order_id.to_string(),
      seller_id: seller_id.to_string(),
      actor: actor.to_string(),
      order: None,
      seller: None,
      quote: None,
      committed: None,
    }
  }
}

#[derive(Clone)]
pub struct AdvanceCtxData {
  pub deps: FlowDeps,
  pub order_id: String,
  pub actor: String,
  pub requested: OrderStatus,
  pub order: Option<Order>,
  /// Status that will actually be persisted for `requested`.
  pub effective: Option<OrderStatus>,
  pub committed: Option<Committed>,
}

impl AdvanceCtxData {
  pub fn new(deps: FlowDeps, order_id: &str, actor: &str, requested: OrderStatus) -> Self {
    Self {
      deps,
      order_id: order_id.to_string(),
      actor: actor.to_string(),
      requested,
      order: None,
      effective: None,
      committed: None,
    }
  }
}
