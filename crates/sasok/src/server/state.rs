use journal::DaemonLog;
use std::sync::Arc;

use crate::ai::AiManager;

/// Shared by every handler through axum state
#[derive(Clone)]
pub struct AppState {
  pub manager: Arc<AiManager>,
  pub logs: DaemonLog,
}

impl AppState {
  pub fn new(manager: AiManager, logs: DaemonLog) -> Self {
    Self { manager: Arc::new(manager), logs }
  }
}
