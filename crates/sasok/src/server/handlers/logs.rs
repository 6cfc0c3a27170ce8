//! Logs endpoint handler

use axum::{
  extract::{Extension, Query},
  http::StatusCode,
  response::Json,
};

use super::{error_response, ErrorResponse};
use crate::server::{
  middleware::RequestContext,
  types::{BaseResponse, LogsQuery, LogsResponse},
};

const DEFAULT_LIMIT: usize = 100;
const LEVELS: [&str; 6] = ["all", "debug", "info", "success", "warn", "error"];

/// GET /logs?limit=&level= - Most recent daemon log entries, oldest first
pub async fn get_logs(
  Extension(context): Extension<RequestContext>,
  Query(query): Query<LogsQuery>,
) -> Result<Json<BaseResponse<LogsResponse>>, ErrorResponse> {
  let level = query.level.as_deref().map(str::to_lowercase);
  if let Some(level) = level.as_deref().filter(|l| !LEVELS.contains(l)) {
    return Err(error_response(
      StatusCode::BAD_REQUEST,
      "invalid_log_level",
      &format!("Unknown log level: {level}"),
      context.request_id,
    ));
  }

  let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
  match context.logger.entries(Some(limit), level.as_deref()).await {
    Ok(logs) => Ok(Json(BaseResponse::success(LogsResponse { logs }, context.request_id))),
    Err(e) => {
      let message = format!("Failed to read logs: {e}");
      context.log_error(&message, "logs-api").await;
      Err(error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "logs_read_failed",
        &message,
        context.request_id,
      ))
    }
  }
}
