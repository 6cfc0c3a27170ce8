//! Analysis pipeline endpoint handlers
//!
//! Pipeline failures are part of the payload (`success: false`), so these
//! return 200 whenever the request itself was well formed.

use axum::{
  extract::{rejection::JsonRejection, Extension, State},
  response::Json,
};
use serde_json::Value;

use super::{invalid_body, ErrorResponse};
use crate::ai::manager::{AnalysisResult, FeedbackAck, SystemStatus, TrainingSummary};
use crate::ai::Outcome;
use crate::server::{
  middleware::RequestContext,
  state::AppState,
  types::{BaseResponse, ProcessRequest},
};

const COMPONENT: &str = "ai-api";

type OutcomeResponse<T> = Result<Json<BaseResponse<Outcome<T>>>, ErrorResponse>;

/// POST /api/ai/process - Route an input through the pipeline
pub async fn process(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  body: Result<Json<ProcessRequest>, JsonRejection>,
) -> OutcomeResponse<AnalysisResult> {
  let Json(request) = body.map_err(|e| invalid_body(e, context.request_id))?;
  context.log_info(&format!("Processing {} input", request.input.input_type), COMPONENT).await;

  let outcome = state.manager.process_input(&request.input, request.context.as_deref()).await;
  report(&context, "Input processed", &outcome).await;

  Ok(Json(BaseResponse::success(outcome, context.request_id)))
}

/// POST /api/ai/feedback - Record feedback for retraining
pub async fn feedback(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  body: Result<Json<Value>, JsonRejection>,
) -> OutcomeResponse<FeedbackAck> {
  let Json(feedback) = body.map_err(|e| invalid_body(e, context.request_id))?;

  let outcome = state.manager.process_feedback(feedback).await;
  report(&context, "Feedback recorded", &outcome).await;

  Ok(Json(BaseResponse::success(outcome, context.request_id)))
}

/// POST /api/ai/train - Trigger a training pass
pub async fn train(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
) -> Json<BaseResponse<Outcome<TrainingSummary>>> {
  let outcome = state.manager.train_models().await;
  report(&context, "Training pass finished", &outcome).await;

  Json(BaseResponse::success(outcome, context.request_id))
}

/// GET /api/ai/status - Component report
pub async fn status(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
) -> Json<BaseResponse<Outcome<SystemStatus>>> {
  Json(BaseResponse::success(state.manager.system_status().await, context.request_id))
}

async fn report<T>(context: &RequestContext, success: &str, outcome: &Outcome<T>) {
  match outcome.error_message() {
    None => context.log_success(success, COMPONENT).await,
    Some(error) => context.log_warn(error, COMPONENT).await,
  }
}
