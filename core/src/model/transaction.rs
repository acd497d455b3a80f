// wallet_flow/src/model/transaction.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
  OrderPicked,
}

impl TransactionType {
  pub fn as_str(&self) -> &'static str {
    match self {
      TransactionType::OrderPicked => "order_picked",
    }
  }
}

/// One monetary event in a seller's wallet. Append-only.
///
/// `amount` is signed: negative values debit the spendable balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
  pub id: Uuid,
  pub order_id: String,
  pub seller_id: String,
  pub amount: Decimal,
  #[serde(rename = "type")]
  pub kind: TransactionType,
  pub affects_revenue: bool,
  pub timestamp: DateTime<Utc>,
  pub note: String,
}
