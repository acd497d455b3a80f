// src/lib.rs

//! wallet_flow: order fulfillment with wallet-backed settlement.
//!
//! A seller picks an order that an admin assigned to them, paying the product
//! cost from their wallet into escrow, then advances it through processing
//! until they request completion. The crate provides:
//!  - The order status state machine (`state_machine`).
//!  - The settlement rules for picked orders (`settlement`).
//!  - The `FulfillmentOrchestrator`, which runs `pick_order` and
//!    `advance_status` as named-step pipelines.
//!  - The `LedgerStore` persistence seam, with an in-memory implementation.
//!  - The async step-pipeline engine the orchestrator is built on (`flow`).

pub mod config;
pub mod error;
pub mod flow;
pub mod model;
pub mod notify;
pub mod orchestrator;
pub mod settlement;
pub mod state_machine;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::config::OrchestratorConfig;
pub use crate::error::{FlowError, FlowResult, FulfillmentError, FulfillmentResult};
pub use crate::flow::{ContextData, FlowRegistry, Pipeline, PipelineControl, PipelineResult};
pub use crate::model::{
  LedgerTransaction, LineItem, Notification, NotificationPriority, NotificationType, Order, OrderStatus, Seller,
  StatusHistoryEntry, TransactionType,
};
pub use crate::notify::{DeliveryError, NotificationSink, TracingNotificationSink};
pub use crate::orchestrator::{FulfillmentOrchestrator, OrderTrail};
pub use crate::settlement::{FundsQuote, MARGIN_RATE, MAX_LEDGER_AMOUNT};
pub use crate::store::{LedgerStore, MemoryLedgerStore, StoreError};
