// wallet_flow/src/error.rs
use crate::model::OrderStatus;
use anyhow::Error as AnyhowError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures of the pipeline engine itself, as opposed to the business
/// conditions a handler reports.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Type mismatch during context downcast (expected {expected_type}, step: '{step_name}')")]
  TypeMismatch { step_name: String, expected_type: String },

  #[error("Error in handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error for step '{step_name}': {message}")]
  ConfigurationError { step_name: String, message: String },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::HandlerError { source: err }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;

/// Everything a fulfillment operation can fail with.
///
/// The first four variants are terminal business conditions: they are
/// returned to the caller verbatim and must never be retried. `StoreUnavailable`
/// and `WriteConflict` are transient; the caller may retry, and the retry
/// re-enters at the order-status compare-and-swap.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FulfillmentError {
  #[error("order {order_id} not found")]
  OrderNotFound { order_id: String },

  #[error("seller {seller_id} not found")]
  SellerNotFound { seller_id: String },

  #[error("{}", describe_invalid_transition(.order_id, .current, .requested, .required))]
  InvalidTransition {
    order_id: String,
    current: OrderStatus,
    requested: OrderStatus,
    /// The status the order must be in for `requested` to be reachable, if
    /// any status leads there through this operation.
    required: Option<OrderStatus>,
  },

  #[error(
    "seller {seller_id} cannot pick order {order_id}: wallet balance {available} is below the required {required}"
  )]
  InsufficientBalance {
    seller_id: String,
    order_id: String,
    available: Decimal,
    required: Decimal,
  },

  #[error("order {order_id} is malformed: line item {item_index} {reason}")]
  MalformedOrder {
    order_id: String,
    item_index: usize,
    reason: String,
  },

  #[error("ledger store unavailable during {operation}: {reason}")]
  StoreUnavailable { operation: &'static str, reason: String },

  /// The store refused the values themselves (out of range, failed check).
  /// Retrying the same request fails the same way.
  #[error("ledger store rejected the write during {operation}: {reason}")]
  StoreRejected { operation: &'static str, reason: String },

  #[error("write conflict on {keys}; another operation changed these records concurrently")]
  WriteConflict { keys: String },

  /// Engine misconfiguration. Stored as text so the error stays `Clone`.
  #[error("workflow error: {0}")]
  Flow(String),
}

fn describe_invalid_transition(
  order_id: &str,
  current: &OrderStatus,
  requested: &OrderStatus,
  required: &Option<OrderStatus>,
) -> String {
  match required {
    Some(required) => format!(
      "order {} cannot move to '{}': it is '{}' but must be '{}'",
      order_id, requested, current, required
    ),
    None => format!(
      "order {} cannot move to '{}' from '{}' through this operation",
      order_id, requested, current
    ),
  }
}

impl FulfillmentError {
  /// Stable machine-readable code, used as the `error` field of API bodies.
  pub fn code(&self) -> &'static str {
    match self {
      FulfillmentError::OrderNotFound { .. } => "OrderNotFound",
      FulfillmentError::SellerNotFound { .. } => "SellerNotFound",
      FulfillmentError::InvalidTransition { .. } => "InvalidTransition",
      FulfillmentError::InsufficientBalance { .. } => "InsufficientBalance",
      FulfillmentError::MalformedOrder { .. } => "MalformedOrder",
      FulfillmentError::StoreUnavailable { .. } => "StoreUnavailable",
      FulfillmentError::StoreRejected { .. } => "StoreRejected",
      FulfillmentError::WriteConflict { .. } => "WriteConflict",
      FulfillmentError::Flow(_) => "WorkflowError",
    }
  }

  /// True for the transient conditions a caller may retry with backoff.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      FulfillmentError::StoreUnavailable { .. } | FulfillmentError::WriteConflict { .. }
    )
  }
}

impl From<FlowError> for FulfillmentError {
  fn from(err: FlowError) -> Self {
    // A handler may have tunnelled a FulfillmentError through anyhow.
    if let FlowError::HandlerError { source } = &err {
      if let Some(inner) = source.downcast_ref::<FulfillmentError>() {
        return inner.clone();
      }
    }
    FulfillmentError::Flow(err.to_string())
  }
}

pub type FulfillmentResult<T, E = FulfillmentError> = std::result::Result<T, E>;
