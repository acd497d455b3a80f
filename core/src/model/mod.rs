// wallet_flow/src/model/mod.rs

//! Records held by the ledger store.

pub mod notification;
pub mod order;
pub mod seller;
pub mod transaction;

pub use notification::{Notification, NotificationPriority, NotificationType};
pub use order::{LineItem, Order, OrderStatus, StatusHistoryEntry, UnknownOrderStatus};
pub use seller::Seller;
pub use transaction::{LedgerTransaction, TransactionType};
