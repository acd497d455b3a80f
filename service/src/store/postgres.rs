// wallet_flow_service/src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;
use wallet_flow::store::{check_ledger_amounts, check_mutation_keys, Committed, LockedRecords, RecordKeys, UpdateFn};
use wallet_flow::{
  LedgerStore, LedgerTransaction, LineItem, Notification, NotificationPriority, NotificationType, Order,
  OrderStatus, Seller, StatusHistoryEntry, StoreError, TransactionType,
};

// Locks are always taken order first, then seller.
const SELECT_ORDER: &str = "SELECT id, order_number, status, items, subtotal, shipping, total, status_history, \
   assigned_by_admin, picked_by, picked_at, completion_requested_at FROM orders WHERE id = $1";
const SELECT_SELLER: &str = "SELECT id, wallet_balance, pending_amount, last_updated FROM sellers WHERE id = $1";

#[derive(Debug, FromRow)]
struct OrderRow {
  id: String,
  order_number: Option<String>,
  status: String,
  items: Json<Vec<LineItem>>,
  subtotal: Decimal,
  shipping: Decimal,
  total: Decimal,
  status_history: Json<Vec<StatusHistoryEntry>>,
  assigned_by_admin: bool,
  picked_by: Option<String>,
  picked_at: Option<DateTime<Utc>>,
  completion_requested_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> Result<Self, StoreError> {
    let status = row
      .status
      .parse::<OrderStatus>()
      .map_err(|e| StoreError::Backend(format!("order {}: {}", row.id, e)))?;
    Ok(Order {
      id: row.id,
      order_number: row.order_number,
      status,
      items: row.items.0,
      subtotal: row.subtotal,
      shipping: row.shipping,
      total: row.total,
      status_history: row.status_history.0,
      assigned_by_admin: row.assigned_by_admin,
      picked_by: row.picked_by,
      picked_at: row.picked_at,
      completion_requested_at: row.completion_requested_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct SellerRow {
  id: String,
  wallet_balance: Decimal,
  pending_amount: Decimal,
  last_updated: DateTime<Utc>,
}

impl From<SellerRow> for Seller {
  fn from(row: SellerRow) -> Self {
    Seller {
      id: row.id,
      wallet_balance: row.wallet_balance,
      pending_amount: row.pending_amount,
      last_updated: row.last_updated,
    }
  }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
  id: Uuid,
  order_id: String,
  seller_id: String,
  amount: Decimal,
  #[sqlx(rename = "type")]
  kind: String,
  affects_revenue: bool,
  timestamp: DateTime<Utc>,
  note: String,
}

impl TryFrom<TransactionRow> for LedgerTransaction {
  type Error = StoreError;

  fn try_from(row: TransactionRow) -> Result<Self, StoreError> {
    let kind = match row.kind.as_str() {
      "order_picked" => TransactionType::OrderPicked,
      other => return Err(unknown_text("wallet_transactions.type", other)),
    };
    Ok(LedgerTransaction {
      id: row.id,
      order_id: row.order_id,
      seller_id: row.seller_id,
      amount: row.amount,
      kind,
      affects_revenue: row.affects_revenue,
      timestamp: row.timestamp,
      note: row.note,
    })
  }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
  id: Uuid,
  #[sqlx(rename = "type")]
  kind: String,
  order_id: String,
  seller_id: Option<String>,
  created_at: DateTime<Utc>,
  read: bool,
  message: String,
  priority: String,
}

impl TryFrom<NotificationRow> for Notification {
  type Error = StoreError;

  fn try_from(row: NotificationRow) -> Result<Self, StoreError> {
    let kind = match row.kind.as_str() {
      "completion_request" => NotificationType::CompletionRequest,
      other => return Err(unknown_text("notifications.type", other)),
    };
    let priority = match row.priority.as_str() {
      "high" => NotificationPriority::High,
      other => return Err(unknown_text("notifications.priority", other)),
    };
    Ok(Notification {
      id: row.id,
      kind,
      order_id: row.order_id,
      seller_id: row.seller_id,
      created_at: row.created_at,
      read: row.read,
      message: row.message,
      priority,
    })
  }
}

fn unknown_text(column: &str, value: &str) -> StoreError {
  StoreError::Backend(format!("unexpected {} value '{}'", column, value))
}

/// Sorts a driver error into the store taxonomy.
///
/// Serialization failures, deadlocks and unique violations mean another writer
/// got there first; connection-level failures mean the database is out of reach.
fn classify(err: sqlx::Error, keys: &str) -> StoreError {
  match &err {
    sqlx::Error::Database(db) => classify_sqlstate(db.code().as_deref(), err.to_string(), keys),
    sqlx::Error::PoolTimedOut
    | sqlx::Error::PoolClosed
    | sqlx::Error::Io(_)
    | sqlx::Error::Tls(_)
    | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
    _ => StoreError::Backend(err.to_string()),
  }
}

/// Class 22 (data exception, e.g. numeric overflow) and the integrity
/// violations other than uniqueness mean the values themselves were refused.
fn classify_sqlstate(code: Option<&str>, message: String, keys: &str) -> StoreError {
  match code {
    Some("40001") | Some("40P01") | Some("23505") => StoreError::Conflict { keys: keys.to_string() },
    Some(code) if code.starts_with("22") || code.starts_with("23") => StoreError::Rejected(message),
    _ => StoreError::Backend(message),
  }
}

/// Ledger store backed by PostgreSQL.
///
/// `transactional_update` runs in one database transaction and holds
/// `SELECT ... FOR UPDATE` row locks on the keyed records until commit.
#[derive(Clone)]
pub struct PgLedgerStore {
  pool: PgPool,
}

impl PgLedgerStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Connects a pool whose `acquire_timeout` matches the orchestrator's store timeout.
  pub async fn connect(url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Self, sqlx::Error> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .acquire_timeout(acquire_timeout)
      .connect(url)
      .await?;
    Ok(Self::new(pool))
  }

  /// Runs the embedded schema migrations.
  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(&self.pool).await
  }

  async fn lock_order(conn: &mut PgConnection, order_id: &str) -> Result<Option<Order>, StoreError> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("{} FOR UPDATE", SELECT_ORDER))
      .bind(order_id)
      .fetch_optional(&mut *conn)
      .await
      .map_err(|e| classify(e, order_id))?;
    row.map(Order::try_from).transpose()
  }

  async fn lock_seller(conn: &mut PgConnection, seller_id: &str) -> Result<Option<Seller>, StoreError> {
    let row: Option<SellerRow> = sqlx::query_as(&format!("{} FOR UPDATE", SELECT_SELLER))
      .bind(seller_id)
      .fetch_optional(&mut *conn)
      .await
      .map_err(|e| classify(e, seller_id))?;
    Ok(row.map(Seller::from))
  }

  async fn write_order(conn: &mut PgConnection, order: &Order) -> Result<(), sqlx::Error> {
    sqlx::query(
      "UPDATE orders SET status = $2, status_history = $3, picked_by = $4, picked_at = $5, \
       completion_requested_at = $6 WHERE id = $1",
    )
    .bind(&order.id)
    .bind(order.status.as_str())
    .bind(Json(&order.status_history))
    .bind(&order.picked_by)
    .bind(order.picked_at)
    .bind(order.completion_requested_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
  }

  async fn write_seller(conn: &mut PgConnection, seller: &Seller) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE sellers SET wallet_balance = $2, pending_amount = $3, last_updated = $4 WHERE id = $1")
      .bind(&seller.id)
      .bind(seller.wallet_balance)
      .bind(seller.pending_amount)
      .bind(seller.last_updated)
      .execute(&mut *conn)
      .await?;
    Ok(())
  }

  async fn append_transaction(conn: &mut PgConnection, txn: &LedgerTransaction) -> Result<(), sqlx::Error> {
    sqlx::query(
      "INSERT INTO wallet_transactions (id, order_id, seller_id, amount, type, affects_revenue, \"timestamp\", note) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(txn.id)
    .bind(&txn.order_id)
    .bind(&txn.seller_id)
    .bind(txn.amount)
    .bind(txn.kind.as_str())
    .bind(txn.affects_revenue)
    .bind(txn.timestamp)
    .bind(&txn.note)
    .execute(&mut *conn)
    .await?;
    Ok(())
  }

  async fn append_notification(conn: &mut PgConnection, notification: &Notification) -> Result<(), sqlx::Error> {
    sqlx::query(
      "INSERT INTO notifications (id, type, order_id, seller_id, created_at, read, message, priority) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(notification.id)
    .bind(notification.kind.as_str())
    .bind(&notification.order_id)
    .bind(&notification.seller_id)
    .bind(notification.created_at)
    .bind(notification.read)
    .bind(&notification.message)
    .bind(notification.priority.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
  }

  /// Inserts or replaces an order. Used for seeding; fulfillment writes go
  /// through `transactional_update`.
  pub async fn upsert_order(&self, order: &Order) -> Result<(), StoreError> {
    sqlx::query(
      "INSERT INTO orders (id, order_number, status, items, subtotal, shipping, total, status_history, \
       assigned_by_admin, picked_by, picked_at, completion_requested_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
       ON CONFLICT (id) DO NOTHING",
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(order.status.as_str())
    .bind(Json(&order.items))
    .bind(order.subtotal)
    .bind(order.shipping)
    .bind(order.total)
    .bind(Json(&order.status_history))
    .bind(order.assigned_by_admin)
    .bind(&order.picked_by)
    .bind(order.picked_at)
    .bind(order.completion_requested_at)
    .execute(&self.pool)
    .await
    .map_err(|e| classify(e, &order.id))?;
    Ok(())
  }

  /// Inserts a seller unless one with the same id exists.
  pub async fn upsert_seller(&self, seller: &Seller) -> Result<(), StoreError> {
    sqlx::query(
      "INSERT INTO sellers (id, wallet_balance, pending_amount, last_updated) VALUES ($1, $2, $3, $4) \
       ON CONFLICT (id) DO NOTHING",
    )
    .bind(&seller.id)
    .bind(seller.wallet_balance)
    .bind(seller.pending_amount)
    .bind(seller.last_updated)
    .execute(&self.pool)
    .await
    .map_err(|e| classify(e, &seller.id))?;
    Ok(())
  }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
  async fn get_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
    let row: Option<OrderRow> = sqlx::query_as(SELECT_ORDER)
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| classify(e, order_id))?;
    row.map(Order::try_from).transpose()
  }

  async fn get_seller(&self, seller_id: &str) -> Result<Option<Seller>, StoreError> {
    let row: Option<SellerRow> = sqlx::query_as(SELECT_SELLER)
      .bind(seller_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| classify(e, seller_id))?;
    Ok(row.map(Seller::from))
  }

  #[instrument(name = "PgLedgerStore::transactional_update", skip(self, update), fields(keys = %keys))]
  async fn transactional_update(&self, keys: RecordKeys, update: UpdateFn) -> Result<Committed, StoreError> {
    let label = keys.to_string();
    // Dropping `tx` on any early return rolls back.
    let mut tx = self.pool.begin().await.map_err(|e| classify(e, &label))?;

    let order = Self::lock_order(&mut *tx, &keys.order_id).await?;
    let seller = match &keys.seller_id {
      Some(seller_id) => Self::lock_seller(&mut *tx, seller_id).await?,
      None => None,
    };

    let mutation = update(LockedRecords { order, seller }).map_err(StoreError::Aborted)?;
    check_mutation_keys(&keys, &mutation)?;
    check_ledger_amounts(&mutation)?;

    Self::write_order(&mut *tx, &mutation.order)
      .await
      .map_err(|e| classify(e, &label))?;
    if let Some(seller) = &mutation.seller {
      Self::write_seller(&mut *tx, seller)
        .await
        .map_err(|e| classify(e, &label))?;
    }
    if let Some(txn) = &mutation.transaction {
      Self::append_transaction(&mut *tx, txn)
        .await
        .map_err(|e| classify(e, &label))?;
    }
    if let Some(notification) = &mutation.notification {
      Self::append_notification(&mut *tx, notification)
        .await
        .map_err(|e| classify(e, &label))?;
    }

    tx.commit().await.map_err(|e| classify(e, &label))?;
    debug!(status = %mutation.order.status, "Committed ledger update.");
    Ok(Committed::from(mutation))
  }

  async fn transactions_for_order(&self, order_id: &str) -> Result<Vec<LedgerTransaction>, StoreError> {
    let rows: Vec<TransactionRow> = sqlx::query_as(
      "SELECT id, order_id, seller_id, amount, type, affects_revenue, \"timestamp\", note \
       FROM wallet_transactions WHERE order_id = $1 ORDER BY seq ASC",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(|e| classify(e, order_id))?;
    rows.into_iter().map(LedgerTransaction::try_from).collect()
  }

  async fn notifications_for_order(&self, order_id: &str) -> Result<Vec<Notification>, StoreError> {
    let rows: Vec<NotificationRow> = sqlx::query_as(
      "SELECT id, type, order_id, seller_id, created_at, read, message, priority \
       FROM notifications WHERE order_id = $1 ORDER BY seq ASC",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(|e| classify(e, order_id))?;
    rows.into_iter().map(Notification::try_from).collect()
  }
}
