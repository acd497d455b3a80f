// wallet_flow/src/model/seller.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A seller's wallet.
///
/// `wallet_balance` is spendable; `pending_amount` is escrow reserved against
/// picked orders. Both are non-negative between operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
  pub id: String,
  pub wallet_balance: Decimal,
  pub pending_amount: Decimal,
  pub last_updated: DateTime<Utc>,
}

impl Seller {
  pub fn new(id: impl Into<String>, wallet_balance: Decimal, now: DateTime<Utc>) -> Self {
    Self {
      id: id.into(),
      wallet_balance,
      pending_amount: Decimal::ZERO,
      last_updated: now,
    }
  }

  /// Spendable plus escrowed funds.
  pub fn total_funds(&self) -> Decimal {
    self.wallet_balance + self.pending_amount
  }
}
