// wallet_flow/src/store/memory.rs

//! In-memory ledger store.
//!
//! All tables sit behind a single mutex, so a transactional update is
//! serialised against every other write. Used by tests, benches and the
//! service's `memory` backend.

use super::{check_ledger_amounts, check_mutation_keys, Committed, LedgerStore, LockedRecords, RecordKeys, StoreError, UpdateFn};
use crate::model::{LedgerTransaction, Notification, Order, Seller};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Default)]
struct Tables {
  orders: HashMap<String, Order>,
  sellers: HashMap<String, Seller>,
  transactions: Vec<LedgerTransaction>,
  notifications: Vec<Notification>,
}

#[derive(Default)]
pub struct MemoryLedgerStore {
  tables: Mutex<Tables>,
  unavailable: AtomicBool,
  latency: Mutex<Option<Duration>>,
  commit_latency: Mutex<Option<Duration>>,
}

impl MemoryLedgerStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts or replaces an order.
  pub fn insert_order(&self, order: Order) {
    self.tables.lock().orders.insert(order.id.clone(), order);
  }

  /// Inserts or replaces a seller.
  pub fn insert_seller(&self, seller: Seller) {
    self.tables.lock().sellers.insert(seller.id.clone(), seller);
  }

  /// Every transaction recorded so far, across all orders.
  pub fn transaction_log(&self) -> Vec<LedgerTransaction> {
    self.tables.lock().transactions.clone()
  }

  /// Every notification raised so far, across all orders.
  pub fn notification_log(&self) -> Vec<Notification> {
    self.tables.lock().notifications.clone()
  }

  /// Makes every subsequent call fail with `Unavailable` until reset.
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  /// Delays every subsequent call by `latency` before it touches the tables.
  pub fn set_latency(&self, latency: Option<Duration>) {
    *self.latency.lock() = latency;
  }

  /// Delays every subsequent commit by `latency` on top of the call latency.
  /// The commit is applied once the delay has passed, whether or not the
  /// caller is still waiting.
  pub fn set_commit_latency(&self, latency: Option<Duration>) {
    *self.commit_latency.lock() = latency;
  }

  async fn simulate_io(&self) -> Result<(), StoreError> {
    let latency = *self.latency.lock();
    if let Some(latency) = latency {
      tokio::time::sleep(latency).await;
    }
    if self.unavailable.load(Ordering::SeqCst) {
      return Err(StoreError::Unavailable("memory store is offline".to_string()));
    }
    Ok(())
  }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
  async fn get_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
    self.simulate_io().await?;
    Ok(self.tables.lock().orders.get(order_id).cloned())
  }

  async fn get_seller(&self, seller_id: &str) -> Result<Option<Seller>, StoreError> {
    self.simulate_io().await?;
    Ok(self.tables.lock().sellers.get(seller_id).cloned())
  }

  async fn transactional_update(&self, keys: RecordKeys, update: UpdateFn) -> Result<Committed, StoreError> {
    self.simulate_io().await?;
    let commit_latency = *self.commit_latency.lock();
    if let Some(latency) = commit_latency {
      tokio::time::sleep(latency).await;
    }

    let mut tables = self.tables.lock();
    let locked = LockedRecords {
      order: tables.orders.get(&keys.order_id).cloned(),
      seller: keys.seller_id.as_ref().and_then(|id| tables.sellers.get(id).cloned()),
    };

    let mutation = update(locked).map_err(|err| {
      trace!(%keys, error = %err, "Update rejected the locked records.");
      StoreError::Aborted(err)
    })?;
    check_mutation_keys(&keys, &mutation)?;
    check_ledger_amounts(&mutation)?;

    tables.orders.insert(mutation.order.id.clone(), mutation.order.clone());
    if let Some(seller) = &mutation.seller {
      tables.sellers.insert(seller.id.clone(), seller.clone());
    }
    if let Some(transaction) = &mutation.transaction {
      tables.transactions.push(transaction.clone());
    }
    if let Some(notification) = &mutation.notification {
      tables.notifications.push(notification.clone());
    }
    debug!(%keys, status = %mutation.order.status, "Committed transactional update.");

    Ok(mutation.into())
  }

  async fn transactions_for_order(&self, order_id: &str) -> Result<Vec<LedgerTransaction>, StoreError> {
    self.simulate_io().await?;
    let tables = self.tables.lock();
    Ok(tables.transactions.iter().filter(|t| t.order_id == order_id).cloned().collect())
  }

  async fn notifications_for_order(&self, order_id: &str) -> Result<Vec<Notification>, StoreError> {
    self.simulate_io().await?;
    let tables = self.tables.lock();
    Ok(tables.notifications.iter().filter(|n| n.order_id == order_id).cloned().collect())
  }
}
