// wallet_flow/src/orchestrator/pick_flow.rs

//! The pick pipeline: a seller claims an assigned order and funds it.

use super::common_steps::{bounded, commit, fetch_order};
use super::contexts::PickCtxData;
use crate::error::FulfillmentError;
use crate::flow::{ContextData, Pipeline, PipelineControl};
use crate::model::OrderStatus;
use crate::settlement;
use crate::state_machine::{self, Trigger};
use crate::store::{LockedRecords, Mutation, RecordKeys, UpdateFn};
use chrono::Utc;
use tracing::{debug, info, warn};

pub(crate) fn pick_pipeline() -> Pipeline<PickCtxData, FulfillmentError> {
  let mut p = Pipeline::<PickCtxData, FulfillmentError>::new(&[
    ("load_order", false, None),
    ("load_seller", false, None),
    ("check_pickable", false, None),
    ("reserve_funds", false, None),
    ("commit_pick", false, None),
  ]);

  p.on_root("load_order", |ctx_data: ContextData<PickCtxData>| {
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

  p.on_root("load_seller", |ctx_data: ContextData<PickCtxData>| {
    Box::pin(async move {
      let (deps, seller_id) = {
        let guard = ctx_data.read();
        (guard.deps.clone(), guard.seller_id.clone())
      };
      let seller = bounded("get_seller", deps.config.store_timeout, deps.store.get_seller(&seller_id))
        .await?
        .ok_or_else(|| FulfillmentError::SellerNotFound {
          seller_id: seller_id.clone(),
        })?;
      debug!(seller_id = %seller.id, wallet_balance = %seller.wallet_balance, "Loaded seller.");
      ctx_data.write().seller = Some(seller);
      Ok::<_, FulfillmentError>(PipelineControl::Continue)
    })
  });

  p.on_root("check_pickable", |ctx_data: ContextData<PickCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let order = guard.order.as_ref().ok_or_else(|| missing("check_pickable", "order"))?;
      state_machine::transition(order, OrderStatus::Picked, &guard.actor, Trigger::Pick, Utc::now())?;
      Ok::<_, FulfillmentError>(PipelineControl::Continue)
    })
  });

  p.on_root("reserve_funds", |ctx_data: ContextData<PickCtxData>| {
    Box::pin(async move {
      let quote = {
        let guard = ctx_data.read();
        let order = guard.order.as_ref().ok_or_else(|| missing("reserve_funds", "order"))?;
        let seller = guard.seller.as_ref().ok_or_else(|| missing("reserve_funds", "seller"))?;
        match settlement::reserve_funds(order, seller, Utc::now()) {
          Ok(reservation) => reservation.quote,
          Err(err) => {
            warn!(order_id = %order.id, seller_id = %seller.id, error = %err, "Pick rejected before commit.");
            return Err(err);
          }
        }
      };
      ctx_data.write().quote = Some(quote);
      Ok::<_, FulfillmentError>(PipelineControl::Continue)
    })
  });

  p.on_root("commit_pick", |ctx_data: ContextData<PickCtxData>| {
    Box::pin(async move {
      let (deps, order_id, seller_id, actor) = {
        let guard = ctx_data.read();
        (
          guard.deps.clone(),
          guard.order_id.clone(),
          guard.seller_id.clone(),
          guard.actor.clone(),
        )
      };

      let keys = RecordKeys::order_and_seller(&order_id, &seller_id);
      let update: UpdateFn = Box::new(move |locked: LockedRecords| {
        let now = Utc::now();
        let mut order = locked.order.ok_or_else(|| FulfillmentError::OrderNotFound {
          order_id: order_id.clone(),
        })?;
        let seller = locked.seller.ok_or_else(|| FulfillmentError::SellerNotFound {
          seller_id: seller_id.clone(),
        })?;

        // Re-checked against the locked records: a concurrent pick that
        // committed first leaves this order in `picked`.
        let transition = state_machine::transition(&order, OrderStatus::Picked, &actor, Trigger::Pick, now)?;
        let reservation = settlement::reserve_funds(&order, &seller, now)?;

        state_machine::apply(&mut order, transition);
        order.picked_by = Some(seller.id.clone());

        Ok(Mutation {
          order,
          seller: Some(reservation.seller),
          transaction: Some(reservation.transaction),
          notification: None,
        })
      });

      let committed = commit(&deps, "commit_pick", keys, update).await?;
      if let Some(seller) = &committed.seller {
        info!(
          order_id = %committed.order.id,
          seller_id = %seller.id,
          wallet_balance = %seller.wallet_balance,
          pending_amount = %seller.pending_amount,
          "Order picked and funds reserved."
        );
      }
      ctx_data.write().committed = Some(committed);
      Ok::<_, FulfillmentError>(PipelineControl::Continue)
    })
  });

  p
}

fn missing(step: &str, what: &str) -> FulfillmentError {
  FulfillmentError::Flow(format!("step '{}' ran before the {} was loaded", step, what))
}
