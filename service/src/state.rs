// wallet_flow_service/src/state.rs
use crate::config::{AppConfig, LedgerBackend};
use crate::errors::{AppError, Result as AppResult};
use crate::seed;
use crate::services::AdminInboxNotifier;
use crate::store::PgLedgerStore;
use std::sync::Arc;
use wallet_flow::{FulfillmentOrchestrator, LedgerStore, MemoryLedgerStore};

#[derive(Clone)]
pub struct AppState {
  pub orchestrator: Arc<FulfillmentOrchestrator>,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  /// Wires the configured ledger backend and the admin notifier into an orchestrator.
  pub async fn from_config(config: Arc<AppConfig>) -> AppResult<Self> {
    let store = build_ledger_store(&config).await?;
    let notifier = Arc::new(AdminInboxNotifier::new(config.admin_inbox.clone()));
    let orchestrator =
      FulfillmentOrchestrator::with_notification_sink(store, notifier, config.orchestrator_config());
    Ok(Self::new(orchestrator, config))
  }

  pub fn new(orchestrator: FulfillmentOrchestrator, config: Arc<AppConfig>) -> Self {
    Self {
      orchestrator: Arc::new(orchestrator),
      config,
    }
  }
}

async fn build_ledger_store(config: &AppConfig) -> AppResult<Arc<dyn LedgerStore>> {
  match config.ledger_backend {
    LedgerBackend::Memory => {
      let store = MemoryLedgerStore::new();
      if config.seed_demo_data {
        seed::seed_memory(&store);
      }
      tracing::warn!("Using the in-memory ledger; all records are lost on shutdown.");
      Ok(Arc::new(store))
    }
    LedgerBackend::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres backend".to_string()))?;
      let store = PgLedgerStore::connect(url, config.database_max_connections, config.store_timeout).await?;
      tracing::info!("Successfully connected to the database.");
      store.migrate().await?;
      tracing::info!("Ledger schema is up to date.");
      if config.seed_demo_data {
        seed::seed_postgres(&store)
          .await
          .map_err(|e| AppError::Fulfillment(e.into_fulfillment("seed")))?;
      }
      Ok(Arc::new(store))
    }
  }
}
