// wallet_flow_service/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use wallet_flow::OrchestratorConfig;

/// Where the ledger lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
  Postgres,
  Memory,
}

impl LedgerBackend {
  pub fn as_str(&self) -> &'static str {
    match self {
      LedgerBackend::Postgres => "postgres",
      LedgerBackend::Memory => "memory",
    }
  }
}

impl fmt::Display for LedgerBackend {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for LedgerBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" => Ok(LedgerBackend::Postgres),
      "memory" => Ok(LedgerBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid LEDGER_BACKEND '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

/// Shape of the log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  /// One JSON object per event.
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!(
        "Invalid LOG_FORMAT '{}': expected 'pretty' or 'json'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub ledger_backend: LedgerBackend,
  /// Required for the postgres backend only.
  pub database_url: Option<String>,
  pub database_max_connections: u32,
  pub store_timeout: Duration,
  /// Name the admin notifier delivers to.
  pub admin_inbox: String,
  /// Seeds one seller and two assigned orders into the selected backend.
  pub seed_demo_data: bool,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse("SERVER_PORT", &get_or("SERVER_PORT", "8080"))?;
    let ledger_backend = get_or("LEDGER_BACKEND", "postgres").parse::<LedgerBackend>()?;
    let database_url = lookup("DATABASE_URL");
    if ledger_backend == LedgerBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required by LEDGER_BACKEND=postgres)".to_string(),
      ));
    }
    let database_max_connections = parse("DATABASE_MAX_CONNECTIONS", &get_or("DATABASE_MAX_CONNECTIONS", "10"))?;
    let store_timeout_ms: u64 = parse("STORE_TIMEOUT_MS", &get_or("STORE_TIMEOUT_MS", "5000"))?;
    if store_timeout_ms == 0 {
      return Err(AppError::Config("Invalid STORE_TIMEOUT_MS: must be positive".to_string()));
    }
    let admin_inbox = get_or("ADMIN_INBOX", "admin-review-queue");
    let seed_demo_data = parse("SEED_DEMO_DATA", &get_or("SEED_DEMO_DATA", "false"))?;
    let log_format = get_or("LOG_FORMAT", "pretty").parse::<LogFormat>()?;

    tracing::info!(backend = %ledger_backend, "Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      ledger_backend,
      database_url,
      database_max_connections,
      store_timeout: Duration::from_millis(store_timeout_ms),
      admin_inbox,
      seed_demo_data,
      log_format,
    })
  }

  pub fn orchestrator_config(&self) -> OrchestratorConfig {
    OrchestratorConfig::with_store_timeout(self.store_timeout)
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse<T>(name: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e)))
}
