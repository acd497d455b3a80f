// wallet_flow/src/config.rs

use std::time::Duration;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime knobs of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
  /// Upper bound on every ledger store call, and on notification delivery.
  pub store_timeout: Duration,
}

impl OrchestratorConfig {
  pub fn with_store_timeout(store_timeout: Duration) -> Self {
    Self { store_timeout }
  }
}

impl Default for OrchestratorConfig {
  fn default() -> Self {
    Self {
      store_timeout: DEFAULT_STORE_TIMEOUT,
    }
  }
}
