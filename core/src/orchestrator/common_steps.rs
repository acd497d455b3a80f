// wallet_flow/src/orchestrator/common_steps.rs

//! Store access shared by the pick and advance pipelines.
//!
//! Every call is bounded by the configured store timeout. Commits run on their
//! own task: when the caller stops waiting the commit still runs to its end,
//! so a timed-out operation is either fully applied or not applied at all.

use super::contexts::FlowDeps;
use crate::error::{FulfillmentError, FulfillmentResult};
use crate::model::Order;
use crate::store::{Committed, RecordKeys, StoreError, UpdateFn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{warn, Instrument};

pub(crate) async fn bounded<T>(
  operation: &'static str,
  limit: Duration,
  call: impl Future<Output = Result<T, StoreError>>,
) -> FulfillmentResult<T> {
  match tokio::time::timeout(limit, call).await {
    Ok(result) => result.map_err(|err| err.into_fulfillment(operation)),
    Err(_) => {
      warn!(operation, timeout_ms = limit.as_millis() as u64, "Ledger store call timed out.");
      Err(FulfillmentError::StoreUnavailable {
        operation,
        reason: format!("no answer within {}ms", limit.as_millis()),
      })
    }
  }
}

pub(crate) async fn fetch_order(deps: &FlowDeps, order_id: &str) -> FulfillmentResult<Order> {
  bounded("get_order", deps.config.store_timeout, deps.store.get_order(order_id))
    .await?
    .ok_or_else(|| FulfillmentError::OrderNotFound {
      order_id: order_id.to_string(),
    })
}

pub(crate) async fn commit(
  deps: &FlowDeps,
  operation: &'static str,
  keys: RecordKeys,
  update: UpdateFn,
) -> FulfillmentResult<Committed> {
  let store = Arc::clone(&deps.store);
  let task = tokio::spawn(async move { store.transactional_update(keys, update).await }.in_current_span());

  bounded(operation, deps.config.store_timeout, async move {
    task
      .await
      .map_err(|err| StoreError::Backend(format!("commit task ended abnormally: {}", err)))?
  })
  .await
}
