// wallet_flow/src/store/mod.rs

//! The ledger store: the one persistence seam of the crate.
//!
//! Reads are plain lookups. Every write goes through
//! [`LedgerStore::transactional_update`], which locks the keyed records, hands
//! their current state to a closure, and commits whatever the closure returns
//! in one atomic unit. The closure is where status compare-and-swap and
//! balance checks happen, so they always see the committed state.

pub mod memory;

use crate::error::FulfillmentError;
use crate::model::{LedgerTransaction, Notification, Order, Seller};
use crate::settlement::MAX_LEDGER_AMOUNT;
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryLedgerStore;

#[derive(Debug, Error)]
pub enum StoreError {
  /// The backend refused the commit because another writer touched the same
  /// records. Nothing was written.
  #[error("conflicting concurrent write on {keys}")]
  Conflict { keys: String },

  /// The backend could not be reached or did not answer in time.
  #[error("store unavailable: {0}")]
  Unavailable(String),

  /// The backend answered but the call failed (bad row, encoding).
  #[error("store backend error: {0}")]
  Backend(String),

  /// The backend refused the values (range or check constraint). Nothing
  /// was written, and the same write fails again.
  #[error("store rejected the values: {0}")]
  Rejected(String),

  /// The update closure rejected the locked records. Nothing was written.
  #[error(transparent)]
  Aborted(FulfillmentError),
}

impl StoreError {
  /// Maps a store failure onto the fulfillment taxonomy.
  ///
  /// `operation` names the store call for the `StoreUnavailable` message.
  pub fn into_fulfillment(self, operation: &'static str) -> FulfillmentError {
    match self {
      StoreError::Conflict { keys } => FulfillmentError::WriteConflict { keys },
      StoreError::Unavailable(reason) | StoreError::Backend(reason) => {
        FulfillmentError::StoreUnavailable { operation, reason }
      }
      StoreError::Rejected(reason) => FulfillmentError::StoreRejected { operation, reason },
      StoreError::Aborted(err) => err,
    }
  }
}

/// The records a transactional update locks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKeys {
  pub order_id: String,
  pub seller_id: Option<String>,
}

impl RecordKeys {
  pub fn order(order_id: impl Into<String>) -> Self {
    Self {
      order_id: order_id.into(),
      seller_id: None,
    }
  }

  pub fn order_and_seller(order_id: impl Into<String>, seller_id: impl Into<String>) -> Self {
    Self {
      order_id: order_id.into(),
      seller_id: Some(seller_id.into()),
    }
  }
}

impl std::fmt::Display for RecordKeys {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.seller_id {
      Some(seller_id) => write!(f, "order {} / seller {}", self.order_id, seller_id),
      None => write!(f, "order {}", self.order_id),
    }
  }
}

/// Current state of the locked records, `None` where a record does not exist.
#[derive(Debug, Clone)]
pub struct LockedRecords {
  pub order: Option<Order>,
  pub seller: Option<Seller>,
}

/// What an update commits. The order is always rewritten; the rest is
/// optional. Transactions and notifications are appended, never replaced.
#[derive(Debug, Clone)]
pub struct Mutation {
  pub order: Order,
  pub seller: Option<Seller>,
  pub transaction: Option<LedgerTransaction>,
  pub notification: Option<Notification>,
}

/// The records as they stand after a successful commit.
#[derive(Debug, Clone)]
pub struct Committed {
  pub order: Order,
  pub seller: Option<Seller>,
  pub notification: Option<Notification>,
}

impl From<Mutation> for Committed {
  fn from(mutation: Mutation) -> Self {
    Self {
      order: mutation.order,
      seller: mutation.seller,
      notification: mutation.notification,
    }
  }
}

/// Computes a [`Mutation`] from the locked records, or rejects them.
pub type UpdateFn = Box<dyn FnOnce(LockedRecords) -> Result<Mutation, FulfillmentError> + Send>;

#[async_trait]
pub trait LedgerStore: Send + Sync {
  async fn get_order(&self, order_id: &str) -> Result<Option<Order>, StoreError>;

  async fn get_seller(&self, seller_id: &str) -> Result<Option<Seller>, StoreError>;

  /// Locks `keys`, runs `update` on their current state and commits the
  /// returned mutation atomically.
  ///
  /// An `Err` from `update` comes back as `StoreError::Aborted` and leaves
  /// every record untouched. The mutation's order and seller must be the
  /// keyed records; anything else is a `Backend` error.
  async fn transactional_update(&self, keys: RecordKeys, update: UpdateFn) -> Result<Committed, StoreError>;

  /// Transactions recorded against `order_id`, oldest first.
  async fn transactions_for_order(&self, order_id: &str) -> Result<Vec<LedgerTransaction>, StoreError>;

  /// Notifications raised for `order_id`, oldest first.
  async fn notifications_for_order(&self, order_id: &str) -> Result<Vec<Notification>, StoreError>;
}

/// Rejects a mutation that writes records other than the locked ones.
pub fn check_mutation_keys(keys: &RecordKeys, mutation: &Mutation) -> Result<(), StoreError> {
  if mutation.order.id != keys.order_id {
    return Err(StoreError::Backend(format!(
      "mutation rewrites order {} while holding {}",
      mutation.order.id, keys
    )));
  }
  if let Some(seller) = &mutation.seller {
    if keys.seller_id.as_deref() != Some(seller.id.as_str()) {
      return Err(StoreError::Backend(format!(
        "mutation rewrites seller {} while holding {}",
        seller.id, keys
      )));
    }
  }
  Ok(())
}

/// Rejects amounts the ledger columns cannot hold: anything beyond
/// `MAX_LEDGER_AMOUNT` in magnitude, and negative seller balances.
pub fn check_ledger_amounts(mutation: &Mutation) -> Result<(), StoreError> {
  let order = &mutation.order;
  let mut amounts = vec![
    ("order subtotal", order.subtotal),
    ("order shipping", order.shipping),
    ("order total", order.total),
  ];
  if let Some(seller) = &mutation.seller {
    for (field, value) in [
      ("seller wallet_balance", seller.wallet_balance),
      ("seller pending_amount", seller.pending_amount),
    ] {
      if value.is_sign_negative() && !value.is_zero() {
        return Err(StoreError::Rejected(format!("{} {} is negative", field, value)));
      }
      amounts.push((field, value));
    }
  }
  if let Some(transaction) = &mutation.transaction {
    amounts.push(("transaction amount", transaction.amount));
  }

  match amounts.into_iter().find(|(_, value)| value.abs() > MAX_LEDGER_AMOUNT) {
    Some((field, value)) => Err(StoreError::Rejected(format!(
      "{} {} exceeds the ledger limit {}",
      field, value, MAX_LEDGER_AMOUNT
    ))),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::LineItem;
  use chrono::Utc;
  use rust_decimal::Decimal;
  use rust_decimal_macros::dec;

  fn mutation(wallet: Decimal, pending: Decimal) -> Mutation {
    let now = Utc::now();
    let order = Order::assigned(
      "ord-limits",
      None,
      vec![LineItem {
        name: "crate".to_string(),
        price: dec!(10.00),
        quantity: 1,
        image_url: None,
      }],
      dec!(0),
      "admin",
      now,
    );
    let mut seller = Seller::new("seller-limits", wallet, now);
    seller.pending_amount = pending;
    Mutation {
      order,
      seller: Some(seller),
      transaction: None,
      notification: None,
    }
  }

  #[test]
  fn amounts_within_the_columns_pass() {
    assert!(check_ledger_amounts(&mutation(dec!(0), MAX_LEDGER_AMOUNT)).is_ok());
  }

  #[test]
  fn amounts_past_the_columns_are_rejected() {
    let err = check_ledger_amounts(&mutation(dec!(0), MAX_LEDGER_AMOUNT + dec!(0.01))).unwrap_err();
    assert!(matches!(err, StoreError::Rejected(ref m) if m.contains("pending_amount")));

    let err = check_ledger_amounts(&mutation(dec!(-0.01), dec!(0))).unwrap_err();
    assert!(matches!(err, StoreError::Rejected(ref m) if m.contains("negative")));
  }

  #[test]
  fn rejected_values_are_not_retryable() {
    let err = StoreError::Rejected("numeric field overflow".to_string()).into_fulfillment("transactional_update");
    assert_eq!(err.code(), "StoreRejected");
    assert!(!err.is_retryable());
  }
}
