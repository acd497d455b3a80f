// wallet_flow_service/src/web/routes.rs

use actix_web::{error, web, HttpResponse};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::fulfillment_handlers;

async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({
      "status": "ok",
      "backend": app_state.config.ledger_backend.as_str(),
  }))
}

/// Malformed JSON bodies answer with the same error shape as every other rejection.
pub fn json_config() -> web::JsonConfig {
  web::JsonConfig::default()
    .error_handler(|err: error::JsonPayloadError, _req| AppError::Validation(err.to_string()).into())
}

// Called from `main.rs` and the integration tests to mount the API.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1") // Base path for API version 1
      .app_data(json_config())
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("/pick", web::post().to(fulfillment_handlers::pick_order_handler))
          .route(
            "/advance-status",
            web::post().to(fulfillment_handlers::advance_status_handler),
          )
          .route("/{order_id}", web::get().to(fulfillment_handlers::get_order_handler)),
      ),
  );
}
