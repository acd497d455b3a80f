// wallet_flow_service/src/web/handlers/fulfillment_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use wallet_flow::OrderStatus;

use crate::errors::AppError;
use crate::state::AppState;

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PickOrderRequest {
  pub order_id: String,
  pub seller_id: String,
  pub actor: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceStatusRequest {
  pub order_id: String,
  pub actor: String,
  /// Status name in `snake_case`, e.g. `processing` or `completed`.
  pub requested_status: String,
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
  if value.trim().is_empty() {
    return Err(AppError::Validation(format!("'{}' must not be empty", field)));
  }
  Ok(())
}

// --- Handler Implementations ---

#[instrument(
  name = "handler::pick_order",
  skip(app_state, req),
  fields(order_id = %req.order_id, seller_id = %req.seller_id)
)]
pub async fn pick_order_handler(
  app_state: web::Data<AppState>,
  req: web::Json<PickOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let req = req.into_inner();
  require("orderId", &req.order_id)?;
  require("sellerId", &req.seller_id)?;
  require("actor", &req.actor)?;

  let order = app_state
    .orchestrator
    .pick_order(&req.order_id, &req.seller_id, &req.actor)
    .await?;

  info!(status = %order.status, "Order picked.");
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}

#[instrument(
  name = "handler::advance_status",
  skip(app_state, req),
  fields(order_id = %req.order_id, requested = %req.requested_status)
)]
pub async fn advance_status_handler(
  app_state: web::Data<AppState>,
  req: web::Json<AdvanceStatusRequest>,
) -> Result<HttpResponse, AppError> {
  let req = req.into_inner();
  require("orderId", &req.order_id)?;
  require("actor", &req.actor)?;
  let requested = req
    .requested_status
    .parse::<OrderStatus>()
    .map_err(|e| AppError::Validation(e.to_string()))?;

  let order = app_state
    .orchestrator
    .advance_status(&req.order_id, &req.actor, requested)
    .await?;

  info!(status = %order.status, "Order status advanced.");
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}

#[instrument(name = "handler::get_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let trail = app_state.orchestrator.order_trail(&order_id).await?;

  Ok(HttpResponse::Ok().json(json!({
      "order": trail.order,
      "transactions": trail.transactions,
      "notifications": trail.notifications,
  })))
}
