// wallet_flow_service/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing
use tracing_subscriber::EnvFilter;
use wallet_flow_service::web::configure_app_routes;
use wallet_flow_service::{AppConfig, AppState, LogFormat};

// RUST_LOG overrides the level.
fn init_tracing(format: LogFormat) {
  let builder = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // The log format is part of the config, so the config loads first.
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => {
      init_tracing(cfg.log_format);
      Arc::new(cfg)
    }
    Err(e) => {
      init_tracing(LogFormat::Pretty);
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(e.into());
    }
  };

  tracing::info!(backend = %app_config.ledger_backend, "Starting wallet flow server...");

  let app_state = match AppState::from_config(app_config.clone()).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, backend = %app_config.ledger_backend, "Failed to initialise the ledger store.");
      return Err(e.into());
    }
  };
  tracing::info!(backend = %app_config.ledger_backend, "Fulfillment pipelines registered.");

  let server_address = app_config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  tracing::info!("Server stopped.");
  Ok(())
}
