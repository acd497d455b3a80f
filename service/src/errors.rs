// wallet_flow_service/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{json, Map, Value};
use thiserror::Error;
use wallet_flow::FulfillmentError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error(transparent)]
  Fulfillment(#[from] FulfillmentError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<FulfillmentError>() {
      Ok(fulfillment) => AppError::Fulfillment(fulfillment),
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

fn fulfillment_status(err: &FulfillmentError) -> StatusCode {
  match err {
    FulfillmentError::OrderNotFound { .. } | FulfillmentError::SellerNotFound { .. } => StatusCode::NOT_FOUND,
    FulfillmentError::InvalidTransition { .. } | FulfillmentError::WriteConflict { .. } => StatusCode::CONFLICT,
    FulfillmentError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
    FulfillmentError::MalformedOrder { .. } | FulfillmentError::StoreRejected { .. } => {
      StatusCode::UNPROCESSABLE_ENTITY
    }
    FulfillmentError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    FulfillmentError::Flow(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

/// `{error, message, retryable, ...context}` for a fulfillment failure.
fn fulfillment_body(err: &FulfillmentError) -> Value {
  let mut body = Map::new();
  body.insert("error".into(), json!(err.code()));
  body.insert("message".into(), json!(err.to_string()));
  body.insert("retryable".into(), json!(err.is_retryable()));

  match err {
    FulfillmentError::OrderNotFound { order_id } => {
      body.insert("orderId".into(), json!(order_id));
    }
    FulfillmentError::SellerNotFound { seller_id } => {
      body.insert("sellerId".into(), json!(seller_id));
    }
    FulfillmentError::InvalidTransition {
      order_id,
      current,
      requested,
      required,
    } => {
      body.insert("orderId".into(), json!(order_id));
      body.insert("currentStatus".into(), json!(current));
      body.insert("requestedStatus".into(), json!(requested));
      body.insert("requiredStatus".into(), json!(required));
    }
    FulfillmentError::InsufficientBalance {
      seller_id,
      order_id,
      available,
      required,
    } => {
      body.insert("orderId".into(), json!(order_id));
      body.insert("sellerId".into(), json!(seller_id));
      body.insert("available".into(), json!(available));
      body.insert("required".into(), json!(required));
    }
    FulfillmentError::MalformedOrder {
      order_id, item_index, ..
    } => {
      body.insert("orderId".into(), json!(order_id));
      body.insert("itemIndex".into(), json!(item_index));
    }
    FulfillmentError::StoreUnavailable { operation, .. } | FulfillmentError::StoreRejected { operation, .. } => {
      body.insert("operation".into(), json!(operation));
    }
    FulfillmentError::WriteConflict { .. } | FulfillmentError::Flow(_) => {}
  }
  Value::Object(body)
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Fulfillment(err) => fulfillment_status(err),
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migrate(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::info!(application_error = %self, status = status.as_u16(), "Request rejected");
    }

    let body = match self {
      AppError::Validation(m) => json!({"error": "ValidationError", "message": m, "retryable": false}),
      AppError::Fulfillment(err) => fulfillment_body(err),
      AppError::Config(m) => json!({"error": "ConfigurationError", "message": m, "retryable": false}),
      AppError::Sqlx(_) | AppError::Migrate(_) => {
        json!({"error": "DatabaseError", "message": "Database operation failed", "retryable": false})
      }
      AppError::Internal(m) => json!({"error": "InternalError", "message": m, "retryable": false}),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
