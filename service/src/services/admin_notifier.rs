// wallet_flow_service/src/services/admin_notifier.rs
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};
use wallet_flow::{DeliveryError, Notification, NotificationSink};

/// Pushes completion requests to the admin review inbox.
///
/// Stands in for the storefront's admin push channel: it logs the delivery
/// and simulates a short network hop.
#[derive(Debug)]
pub struct AdminInboxNotifier {
  inbox: String,
  latency: Duration,
  delivered: AtomicU64,
}

impl AdminInboxNotifier {
  pub fn new(inbox: impl Into<String>) -> Self {
    Self {
      inbox: inbox.into(),
      latency: Duration::from_millis(20),
      delivered: AtomicU64::new(0),
    }
  }

  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }

  pub fn inbox(&self) -> &str {
    &self.inbox
  }

  pub fn delivered_count(&self) -> u64 {
    self.delivered.load(Ordering::Relaxed)
  }

  /// Returns the delivery id the inbox assigned.
  async fn push(&self, notification: &Notification) -> Result<String, DeliveryError> {
    info!(
      "Delivering admin notification: Inbox='{}', Order='{}', Priority='{}'",
      self.inbox,
      notification.order_id,
      notification.priority.as_str()
    );
    tokio::time::sleep(self.latency).await; // Simulate network latency

    if self.inbox.is_empty() {
      warn!(notification_id = %notification.id, "No admin inbox configured.");
      return Err(DeliveryError {
        notification_id: notification.id.to_string(),
        reason: "admin inbox name is empty".to_string(),
      });
    }

    let message_preview = notification.message.chars().take(50).collect::<String>() + "...";
    let delivery_id = format!("admin_push_{}", uuid::Uuid::new_v4());
    info!(
      inbox = %self.inbox,
      order_id = %notification.order_id,
      preview = %message_preview,
      "Admin notification delivered. Delivery ID: {}",
      delivery_id
    );
    Ok(delivery_id)
  }
}

#[async_trait]
impl NotificationSink for AdminInboxNotifier {
  async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
    let delivery_id = self.push(notification).await?;
    self.delivered.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(%delivery_id, notification_id = %notification.id, "Admin delivery recorded.");
    Ok(())
  }
}
