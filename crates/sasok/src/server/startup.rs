//! REST server startup and configuration

use anyhow::{Context, Result};
use axum::serve;
use journal::DaemonLog;
use std::path::Path;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ai::{provider::default_provider, AiManager};
use crate::config::Config;
use crate::server::{routing::create_router, state::AppState};

pub const SERVER_LOG_FILE: &str = "server.logs.jsonl";
const COMPONENT: &str = "sasok-server";

/// Build the shared state rooted at `data_dir`
pub fn build_state(config: &Config, data_dir: &Path) -> Result<AppState> {
  std::fs::create_dir_all(data_dir)
    .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

  let logs = DaemonLog::open(data_dir.join(SERVER_LOG_FILE))?;
  let manager = AiManager::new(config, data_dir, default_provider(config))?;
  Ok(AppState::new(manager, logs))
}

/// Start the REST server and run until Ctrl-C
pub async fn start_server(config: Config) -> Result<()> {
  let data_dir = config.data_dir();
  let addr = config.server.bind;
  let state = build_state(&config, &data_dir)?;
  let logs = state.logs.clone();

  logs.info(&format!("Starting SASOK REST server on {addr}"), COMPONENT).await;

  let app = create_router(state).layer(
    ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()),
  );

  let listener = TcpListener::bind(addr).await.with_context(|| format!("Failed to bind {addr}"))?;
  logs.info(&format!("Server listening on {addr}"), COMPONENT).await;

  match serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
    Ok(()) => {
      logs.info("Server shutdown gracefully", COMPONENT).await;
      Ok(())
    }
    Err(e) => {
      logs.error(&format!("Server error: {e}"), COMPONENT).await;
      Err(anyhow::anyhow!("Server error: {}", e))
    }
  }
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("Failed to listen for shutdown signal: {e}");
    std::future::pending::<()>().await;
  }
  tracing::info!("Shutdown signal received");
}
