//! Request context and middleware for the REST API
//!
//! Every request gets a [`RequestContext`] carrying its id, request metadata and
//! the daemon log, injected as an extension so handlers can log with context.

use axum::{
  extract::{Request, State},
  http::{Method, Uri},
  middleware::Next,
  response::Response,
};
use journal::{DaemonLog, Level, LogContext};
use std::time::Instant;
use uuid::Uuid;

use crate::server::state::AppState;

const COMPONENT: &str = "http-request";

#[derive(Clone)]
pub struct RequestContext {
  pub request_id: Uuid,
  pub method: Method,
  pub uri: Uri,
  pub user_agent: Option<String>,
  pub logger: DaemonLog,
}

impl RequestContext {
  pub fn new(method: Method, uri: Uri, user_agent: Option<String>, logger: DaemonLog) -> Self {
    Self { request_id: Uuid::new_v4(), method, uri, user_agent, logger }
  }

  pub async fn log_info(&self, message: &str, component: &str) {
    self.log(Level::Info, message, component, None, None).await;
  }

  pub async fn log_success(&self, message: &str, component: &str) {
    self.log(Level::Success, message, component, None, None).await;
  }

  pub async fn log_warn(&self, message: &str, component: &str) {
    self.log(Level::Warn, message, component, None, None).await;
  }

  pub async fn log_error(&self, message: &str, component: &str) {
    self.log(Level::Error, message, component, None, None).await;
  }

  /// Log with the request metadata attached as structured context
  pub async fn log(
    &self,
    level: Level,
    message: &str,
    component: &str,
    status_code: Option<u16>,
    duration_ms: Option<f64>,
  ) {
    let context = LogContext {
      request_id: Some(self.request_id.to_string()),
      method: Some(self.method.to_string()),
      path: Some(self.uri.path().to_string()),
      user_agent: self.user_agent.clone(),
      duration_ms,
      status_code,
    };
    self.logger.log(level, message, component, Some(context)).await;
  }
}

/// Wrap every request with start/completion logging and inject its context
pub async fn request_context_middleware(
  State(state): State<AppState>,
  mut request: Request,
  next: Next,
) -> Response {
  let user_agent = request
    .headers()
    .get(axum::http::header::USER_AGENT)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string);
  let context =
    RequestContext::new(request.method().clone(), request.uri().clone(), user_agent, state.logs.clone());

  let start_time = Instant::now();
  context.log_info("Request started", COMPONENT).await;

  request.extensions_mut().insert(context.clone());
  let response = next.run(request).await;

  let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
  let status = response.status();
  let level = if status.is_server_error() { Level::Error } else { Level::Info };
  context.log(level, "Request completed", COMPONENT, Some(status.as_u16()), Some(duration_ms)).await;

  response
}
