// wallet_flow/src/orchestrator/advance_flow.rs

//! The advance pipeline: a seller moves a picked order forward.
//!
//! Asking for `completed` raises a completion request instead; the admin
//! notification is written in the same commit and then handed to the sink.

use super::common_steps::{commit, fetch_order};
use super::contexts::AdvanceCtxData;
use crate::error::FulfillmentError;
use crate::flow::{ContextData, Pipeline, PipelineControl, SkipCondition};
use crate::model::{Notification, OrderStatus};
use crate::notify::NotificationSink;
use crate::state_machine::{self, Trigger};
use crate::store::{LockedRecords, Mutation, RecordKeys, UpdateFn};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub(crate) fn advance_pipeline(sink: Arc<dyn NotificationSink>) -> Pipeline<AdvanceCtxData, FulfillmentError> {
  let nothing_to_notify: SkipCondition<AdvanceCtxData> = Arc::new(|ctx_data: ContextData<AdvanceCtxData>| {
    let guard = ctx_data.read();
    guard.committed.as_ref().map_or(true, |c| c.notification.is_none())
  });

  let mut p = Pipeline::<AdvanceCtxData, FulfillmentError>::new(&[
    ("load_order", false, None),
    ("validate_transition", false, None),
    ("commit_transition", false, None),
    ("notify_admin", true, Some(nothing_to_notify)),
  ]);

  p.on_root("load_order", |ctx_data: ContextData<AdvanceCtxData>| {
    Box::pin(async move {
      let (deps, order_id) = {
        let guard = ctx_data.read();
        (guard.deps.clone(), guard.order_id.clone())
      };
      let order = fetch_order(&deps, &order_id).await?;
      debug!(order_id = %order.id, status = %order.status, "Loaded order.");
      ctx_data.write().order = Some(order);
      Ok::<_, FulfillmentError>(PipelineControl::Continue)
    })
  });

  p.on_root("validate_transition", |ctx_data: ContextData<AdvanceCtxData>| {
    Box::pin(async move {
      let effective = {
        let guard = ctx_data.read();
        let order = guard.order.as_ref().ok_or_else(|| {
          FulfillmentError::Flow("step 'validate_transition' ran before the order was loaded".to_string())
        })?;
        state_machine::transition(order, guard.requested, &guard.actor, Trigger::Advance, Utc::now())?.effective
      };
      ctx_data.write().effective = Some(effective);
      Ok::<_, FulfillmentError>(PipelineControl::Continue)
    })
  });

  p.on_root("commit_transition", |ctx_data: ContextData<AdvanceCtxData>| {
    Box::pin(async move {
      let (deps, order_id, actor, requested) = {
        let guard = ctx_data.read();
        (guard.deps.clone(), guard.order_id.clone(), guard.actor.clone(), guard.requested)
      };

      let keys = RecordKeys::order(&order_id);
      let update: UpdateFn = Box::new(move |locked: LockedRecords| {
        let now = Utc::now();
        let mut order = locked.order.ok_or_else(|| FulfillmentError::OrderNotFound {
          order_id: order_id.clone(),
        })?;

        let transition = state_machine::transition(&order, requested, &actor, Trigger::Advance, now)?;
        let raises_request = transition.effective == OrderStatus::CompletionRequested;
        state_machine::apply(&mut order, transition);
        let notification = raises_request.then(|| Notification::completion_request(&order, now));

        Ok(Mutation {
          order,
          seller: None,
          transaction: None,
          notification,
        })
      });

      let committed = commit(&deps, "commit_transition", keys, update).await?;
      info!(
        order_id = %committed.order.id,
        status = %committed.order.status,
        requested = %requested,
        "Order status advanced."
      );
      ctx_data.write().committed = Some(committed);
      Ok::<_, FulfillmentError>(PipelineControl::Continue)
    })
  });

  p.on_root("notify_admin", move |ctx_data: ContextData<AdvanceCtxData>| {
    let sink = Arc::clone(&sink);
    Box::pin(async move {
      let (notification, limit) = {
        let guard = ctx_data.read();
        (
          guard.committed.as_ref().and_then(|c| c.notification.clone()),
          guard.deps.config.store_timeout,
        )
      };
      let Some(notification) = notification else {
        return Ok::<_, FulfillmentError>(PipelineControl::Continue);
      };

      match tokio::time::timeout(limit, sink.deliver(&notification)).await {
        Ok(Ok(())) => debug!(notification_id = %notification.id, "Admin notification delivered."),
        Ok(Err(err)) => warn!(
          notification_id = %notification.id,
          order_id = %notification.order_id,
          error = %err,
          "Admin notification delivery failed; the record stays in the store."
        ),
        Err(_) => warn!(
          notification_id = %notification.id,
          order_id = %notification.order_id,
          "Admin notification delivery timed out; the record stays in the store."
        ),
      }
      Ok::<_, FulfillmentError>(PipelineControl::Continue)
    })
  });

  p
}
