// wallet_flow/src/state_machine.rs

//! Order status transitions.
//!
//! The valid moves form a closed table. Each edge names the operation that
//! may take it: picking is the only way out of `assigned` because it is the
//! only move that touches the seller's wallet.
//!
//! | from         | requested   | effective              | trigger |
//! |--------------|-------------|------------------------|---------|
//! | `assigned`   | `picked`    | `picked`               | pick    |
//! | `picked`     | `processing`| `processing`           | advance |
//! | `processing` | `completed` | `completion_requested` | advance |
//!
//! `completed` itself is only ever set by admin approval.

use crate::error::FulfillmentError;
use crate::model::{Order, OrderStatus, StatusHistoryEntry};
use chrono::{DateTime, Utc};

/// Note attached to the history entry of a completion request.
pub const COMPLETION_REQUEST_NOTE: &str = "Seller requested completion; awaiting admin approval";

/// The operation asking for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
  Pick,
  Advance,
}

struct Edge {
  from: OrderStatus,
  requested: OrderStatus,
  effective: OrderStatus,
  trigger: Trigger,
}

const TRANSITIONS: [Edge; 3] = [
  Edge {
    from: OrderStatus::Assigned,
    requested: OrderStatus::Picked,
    effective: OrderStatus::Picked,
    trigger: Trigger::Pick,
  },
  Edge {
    from: OrderStatus::Picked,
    requested: OrderStatus::Processing,
    effective: OrderStatus::Processing,
    trigger: Trigger::Advance,
  },
  Edge {
    from: OrderStatus::Processing,
    requested: OrderStatus::Completed,
    effective: OrderStatus::CompletionRequested,
    trigger: Trigger::Advance,
  },
];

/// A validated transition, ready to be applied to the order it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
  pub from: OrderStatus,
  pub requested: OrderStatus,
  /// What is persisted. Differs from `requested` for completion requests.
  pub effective: OrderStatus,
  pub entry: StatusHistoryEntry,
}

/// The status an order must be in for `trigger` to reach `requested`.
pub fn required_predecessor(requested: OrderStatus, trigger: Trigger) -> Option<OrderStatus> {
  TRANSITIONS
    .iter()
    .find(|edge| edge.requested == requested && edge.trigger == trigger)
    .map(|edge| edge.from)
}

/// Validates moving `order` to `requested` and builds the history entry.
///
/// Pure: nothing is written, and the clock is an argument.
pub fn transition(
  order: &Order,
  requested: OrderStatus,
  actor: &str,
  trigger: Trigger,
  now: DateTime<Utc>,
) -> Result<Transition, FulfillmentError> {
  let edge = TRANSITIONS
    .iter()
    .find(|edge| edge.from == order.status && edge.requested == requested && edge.trigger == trigger)
    .ok_or_else(|| FulfillmentError::InvalidTransition {
      order_id: order.id.clone(),
      current: order.status,
      requested,
      required: required_predecessor(requested, trigger),
    })?;

  let note = (edge.effective == OrderStatus::CompletionRequested).then(|| COMPLETION_REQUEST_NOTE.to_string());

  Ok(Transition {
    from: edge.from,
    requested,
    effective: edge.effective,
    entry: StatusHistoryEntry {
      status: edge.effective,
      timestamp: now,
      updated_by: actor.to_string(),
      note,
    },
  })
}

/// Applies a transition computed by [`transition`] for this same order.
///
/// Appends the history entry and stamps `picked_at` or
/// `completion_requested_at` as the effective status calls for.
pub fn apply(order: &mut Order, transition: Transition) {
  debug_assert_eq!(order.status, transition.from);
  order.status = transition.effective;
  match transition.effective {
    OrderStatus::Picked => order.picked_at = Some(transition.entry.timestamp),
    OrderStatus::CompletionRequested => order.completion_requested_at = Some(transition.entry.timestamp),
    _ => {}
  }
  order.status_history.push(transition.entry);
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  fn order_in(status: OrderStatus) -> Order {
    let mut order = Order::assigned("ord-00000001", None, vec![], dec!(0), "admin", Utc::now());
    order.status = status;
    order.status_history.last_mut().unwrap().status = status;
    order
  }

  #[test]
  fn pick_moves_assigned_to_picked() {
    let order = order_in(OrderStatus::Assigned);
    let t = transition(&order, OrderStatus::Picked, "seller-1", Trigger::Pick, Utc::now()).unwrap();
    assert_eq!(t.effective, OrderStatus::Picked);
    assert_eq!(t.entry.updated_by, "seller-1");
    assert!(t.entry.note.is_none());
  }

  #[test]
  fn completed_request_is_rewritten_to_completion_requested() {
    let order = order_in(OrderStatus::Processing);
    let t = transition(&order, OrderStatus::Completed, "seller-1", Trigger::Advance, Utc::now()).unwrap();
    assert_eq!(t.requested, OrderStatus::Completed);
    assert_eq!(t.effective, OrderStatus::CompletionRequested);
    assert_eq!(t.entry.status, OrderStatus::CompletionRequested);
    assert_eq!(t.entry.note.as_deref(), Some(COMPLETION_REQUEST_NOTE));
  }

  #[test]
  fn advance_cannot_pick() {
    let order = order_in(OrderStatus::Assigned);
    let err = transition(&order, OrderStatus::Picked, "seller-1", Trigger::Advance, Utc::now()).unwrap_err();
    assert_eq!(
      err,
      FulfillmentError::InvalidTransition {
        order_id: order.id.clone(),
        current: OrderStatus::Assigned,
        requested: OrderStatus::Picked,
        required: None,
      }
    );
  }

  #[test]
  fn skipping_a_status_reports_the_required_one() {
    let order = order_in(OrderStatus::Picked);
    let err = transition(&order, OrderStatus::Completed, "seller-1", Trigger::Advance, Utc::now()).unwrap_err();
    match err {
      FulfillmentError::InvalidTransition { current, required, .. } => {
        assert_eq!(current, OrderStatus::Picked);
        assert_eq!(required, Some(OrderStatus::Processing));
      }
      other => panic!("expected InvalidTransition, got {:?}", other),
    }
  }

  #[test]
  fn only_table_edges_are_accepted() {
    let triggers = [Trigger::Pick, Trigger::Advance];
    let mut accepted = Vec::new();
    for from in OrderStatus::ALL {
      for requested in OrderStatus::ALL {
        for trigger in triggers {
          if transition(&order_in(from), requested, "a", trigger, Utc::now()).is_ok() {
            accepted.push((from, requested, trigger));
          }
        }
      }
    }
    assert_eq!(
      accepted,
      vec![
        (OrderStatus::Assigned, OrderStatus::Picked, Trigger::Pick),
        (OrderStatus::Picked, OrderStatus::Processing, Trigger::Advance),
        (OrderStatus::Processing, OrderStatus::Completed, Trigger::Advance),
      ]
    );
  }

  #[test]
  fn apply_appends_history_and_stamps_timestamps() {
    let mut order = order_in(OrderStatus::Processing);
    let before = order.status_history.len();
    let now = Utc::now();
    let t = transition(&order, OrderStatus::Completed, "seller-1", Trigger::Advance, now).unwrap();
    apply(&mut order, t);

    assert_eq!(order.status_history.len(), before + 1);
    assert_eq!(order.status_history.last().unwrap().status, order.status);
    assert_eq!(order.completion_requested_at, Some(now));
    assert!(order.picked_at.is_none());
  }
}
