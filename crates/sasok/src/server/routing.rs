//! Axum router configuration for all endpoints

use axum::{
  middleware,
  routing::{get, post},
  Router,
};

use crate::server::handlers::{ai, logs, status, stubs};
use crate::server::middleware::request_context_middleware;
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Status and version endpoints
    .route("/health", get(status::health))
    .route("/version", get(status::version))
    .route("/logs", get(logs::get_logs))
    // Placeholder endpoints
    .route("/api/ai/emotion-analysis", post(stubs::emotion_analysis))
    .route("/api/ai/nlp-process", post(stubs::nlp_process))
    .route("/api/web3/connect", post(stubs::connect_wallet))
    .route("/api/web3/transactions/{address}", get(stubs::transactions))
    .route("/api/analytics/log", post(stubs::log_interaction))
    .route("/api/analytics/stats", get(stubs::analytics_stats))
    // Analysis pipeline
    .route("/api/ai/process", post(ai::process))
    .route("/api/ai/feedback", post(ai::feedback))
    .route("/api/ai/train", post(ai::train))
    .route("/api/ai/status", get(ai::status))
    .layer(middleware::from_fn_with_state(state.clone(), request_context_middleware))
    .with_state(state)
}
