// wallet_flow/src/notify.rs

//! Delivery of committed admin notifications.
//!
//! The notification record is already persisted by the time a sink sees it;
//! delivery only pushes it toward whoever watches the admin queue. A failed
//! delivery is logged by the caller and never fails the operation.

use crate::model::Notification;
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("notification {notification_id} not delivered: {reason}")]
pub struct DeliveryError {
  pub notification_id: String,
  pub reason: String,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
  async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Emits each notification as a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
  async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
    info!(
      notification_id = %notification.id,
      order_id = %notification.order_id,
      seller_id = ?notification.seller_id,
      priority = ?notification.priority,
      "{}",
      notification.message
    );
    Ok(())
  }
}
