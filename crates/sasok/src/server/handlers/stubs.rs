//! Placeholder endpoints with fixed bodies
//!
//! These keep the public surface stable for the frontend; none of them touch
//! the analysis pipeline.

use axum::{
  extract::{rejection::JsonRejection, Extension, Path, Query},
  response::Json,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{invalid_body, ErrorResponse};
use crate::server::middleware::RequestContext;
use crate::server::types::{
  AnalyticsStats, EmotionAnalysisStub, InteractionLogged, NlpProcessQuery, NlpProcessStub,
  TransactionsStub, UserInteraction, WalletConnection, WalletQuery,
};

/// POST /api/ai/emotion-analysis
pub async fn emotion_analysis(
  Extension(context): Extension<RequestContext>,
  body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<EmotionAnalysisStub>, ErrorResponse> {
  body.map_err(|e| invalid_body(e, context.request_id))?;
  Ok(Json(EmotionAnalysisStub {
    status: "success".to_string(),
    emotion: "neutral".to_string(),
    confidence: 0.85,
  }))
}

/// POST /api/ai/nlp-process?text=
pub async fn nlp_process(Query(_query): Query<NlpProcessQuery>) -> Json<NlpProcessStub> {
  Json(NlpProcessStub {
    status: "success".to_string(),
    intent: "query".to_string(),
    entities: Vec::new(),
    sentiment: "neutral".to_string(),
  })
}

/// POST /api/web3/connect?wallet_address=
pub async fn connect_wallet(Query(query): Query<WalletQuery>) -> Json<WalletConnection> {
  Json(WalletConnection {
    status: "connected".to_string(),
    address: query.wallet_address,
    network: "ethereum".to_string(),
  })
}

/// GET /api/web3/transactions/{address}
pub async fn transactions(Path(_address): Path<String>) -> Json<TransactionsStub> {
  Json(TransactionsStub { status: "success".to_string(), transactions: Vec::new() })
}

/// POST /api/analytics/log
pub async fn log_interaction(
  Extension(context): Extension<RequestContext>,
  body: Result<Json<UserInteraction>, JsonRejection>,
) -> Result<Json<InteractionLogged>, ErrorResponse> {
  let Json(interaction) = body.map_err(|e| invalid_body(e, context.request_id))?;
  context
    .log_info(
      &format!("Analytics event '{}' from {}", interaction.interaction_type, interaction.user_id),
      "analytics-api",
    )
    .await;

  Ok(Json(InteractionLogged {
    status: "success".to_string(),
    interaction_id: "generated_id".to_string(),
  }))
}

/// GET /api/analytics/stats
pub async fn analytics_stats() -> Json<AnalyticsStats> {
  let emotion_distribution =
    BTreeMap::from([("happy".to_string(), 45), ("neutral".to_string(), 30), ("sad".to_string(), 25)]);

  Json(AnalyticsStats { active_users: 1234, total_interactions: 5678, emotion_distribution })
}
