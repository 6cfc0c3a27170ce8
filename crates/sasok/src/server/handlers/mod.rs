pub mod ai;
pub mod logs;
pub mod status;
pub mod stubs;

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::Json};
use uuid::Uuid;

use crate::server::types::{ApiError, BaseResponse};

/// Error half of every enveloped handler
pub type ErrorResponse = (StatusCode, Json<BaseResponse<()>>);

pub fn error_response(
  status: StatusCode,
  key: &str,
  message: &str,
  request_id: Uuid,
) -> ErrorResponse {
  let error = ApiError::new(key, message);
  (status, Json(BaseResponse::<()>::error(vec![error], request_id)))
}

/// Malformed or invalid JSON bodies keep axum's status but use the envelope
pub fn invalid_body(rejection: JsonRejection, request_id: Uuid) -> ErrorResponse {
  error_response(rejection.status(), "invalid_request_body", &rejection.body_text(), request_id)
}
