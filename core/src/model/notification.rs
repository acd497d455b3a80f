// wallet_flow/src/model/notification.rs

use super::order::Order;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
  CompletionRequest,
}

impl NotificationType {
  pub fn as_str(&self) -> &'static str {
    match self {
      NotificationType::CompletionRequest => "completion_request",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
  High,
}

impl NotificationPriority {
  pub fn as_str(&self) -> &'static str {
    match self {
      NotificationPriority::High => "high",
    }
  }
}

/// A message addressed to the admin review queue.
///
/// Created unread; only the admin workflow flips `read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: Uuid,
  #[serde(rename = "type")]
  pub kind: NotificationType,
  pub order_id: String,
  pub seller_id: Option<String>,
  pub created_at: DateTime<Utc>,
  pub read: bool,
  pub message: String,
  pub priority: NotificationPriority,
}

impl Notification {
  /// The admin-facing request raised when a seller asks to complete `order`.
  pub fn completion_request(order: &Order, now: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4(),
      kind: NotificationType::CompletionRequest,
      order_id: order.id.clone(),
      seller_id: order.picked_by.clone(),
      created_at: now,
      read: false,
      message: format!(
        "Order #{} has been marked as completed by the seller and is awaiting your approval.",
        order.display_label()
      ),
      priority: NotificationPriority::High,
    }
  }
}
