// wallet_flow/src/model/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an order. Serialized in `snake_case`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Assigned,
  Picked,
  Processing,
  CompletionRequested,
  /// Reached only through admin approval, never by this crate.
  Completed,
  /// Reserved. No fulfillment operation moves an order here.
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 6] = [
    OrderStatus::Assigned,
    OrderStatus::Picked,
    OrderStatus::Processing,
    OrderStatus::CompletionRequested,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Assigned => "assigned",
      OrderStatus::Picked => "picked",
      OrderStatus::Processing => "processing",
      OrderStatus::CompletionRequested => "completion_requested",
      OrderStatus::Completed => "completed",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOrderStatus(pub String);

impl fmt::Display for UnknownOrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown order status '{}'", self.0)
  }
}

impl std::error::Error for UnknownOrderStatus {}

impl FromStr for OrderStatus {
  type Err = UnknownOrderStatus;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .iter()
      .copied()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| UnknownOrderStatus(s.to_string()))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
  pub name: String,
  pub price: Decimal,
  pub quantity: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
}

impl LineItem {
  /// `price * quantity`, or `None` when the product does not fit a `Decimal`.
  pub fn checked_line_total(&self) -> Option<Decimal> {
    self.price.checked_mul(Decimal::from(self.quantity))
  }
}

/// One entry of an order's append-only status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
  pub status: OrderStatus,
  pub timestamp: DateTime<Utc>,
  pub updated_by: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub note: Option<String>,
}

/// An order as held by the ledger store.
///
/// `status_history` is only ever appended to, and its last entry always
/// carries the current `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: String,
  #[serde(default)]
  pub order_number: Option<String>,
  pub status: OrderStatus,
  pub items: Vec<LineItem>,
  pub subtotal: Decimal,
  pub shipping: Decimal,
  pub total: Decimal,
  pub status_history: Vec<StatusHistoryEntry>,
  #[serde(default)]
  pub assigned_by_admin: bool,
  /// Seller whose wallet funded the pick.
  #[serde(default)]
  pub picked_by: Option<String>,
  #[serde(default)]
  pub picked_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub completion_requested_at: Option<DateTime<Utc>>,
}

impl Order {
  /// Builds an order in `assigned` status with its first history entry.
  ///
  /// Orders are created by the admin side of the storefront; this constructor
  /// exists for seeding and tests.
  pub fn assigned(
    id: impl Into<String>,
    order_number: Option<String>,
    items: Vec<LineItem>,
    shipping: Decimal,
    assigned_by: impl Into<String>,
    now: DateTime<Utc>,
  ) -> Self {
    // Display totals only; settlement re-prices the items with checked arithmetic.
    let subtotal = items.iter().fold(Decimal::ZERO, |acc, item| {
      acc.saturating_add(item.price.saturating_mul(Decimal::from(item.quantity)))
    });
    Self {
      id: id.into(),
      order_number,
      status: OrderStatus::Assigned,
      items,
      subtotal,
      shipping,
      total: subtotal.saturating_add(shipping),
      status_history: vec![StatusHistoryEntry {
        status: OrderStatus::Assigned,
        timestamp: now,
        updated_by: assigned_by.into(),
        note: None,
      }],
      assigned_by_admin: true,
      picked_by: None,
      picked_at: None,
      completion_requested_at: None,
    }
  }

  /// Human-facing label: the order number, or the first 8 characters of the id.
  pub fn display_label(&self) -> String {
    match &self.order_number {
      Some(number) if !number.is_empty() => number.clone(),
      _ => self.id.chars().take(8).collect(),
    }
  }
}
