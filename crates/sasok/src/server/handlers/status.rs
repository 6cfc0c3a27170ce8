//! Health and version endpoint handlers

use axum::{extract::Extension, response::Json};

use crate::server::{
  middleware::RequestContext,
  types::{BaseResponse, HealthResponse, VersionResponse},
};

/// GET /health
pub async fn health() -> Json<HealthResponse> {
  Json(HealthResponse { status: "healthy".to_string() })
}

/// GET /version - Returns current API version
pub async fn version(
  Extension(context): Extension<RequestContext>,
) -> Json<BaseResponse<VersionResponse>> {
  let response = VersionResponse { version: env!("CARGO_PKG_VERSION").to_string() };
  Json(BaseResponse::success(response, context.request_id))
}
