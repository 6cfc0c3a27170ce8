//! REST API types with schemars annotations for OpenAPI generation

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::ai::manager::AiInput;

// Base Response Structure
// ======================

/// Envelope for the manager-backed endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API versioning information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  /// The latest version of the API
  pub latest: String,

  /// The version of the API requested by the client
  pub requested: String,

  /// The version of the API that was used in producing the response
  pub resolved: String,
}

/// API error information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,

  /// Additional error context
  #[serde(default)]
  pub context: Value,
}

/// Response for /version endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionResponse {
  pub version: String,
}

// Logs Endpoint
// =============

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct LogsQuery {
  /// Maximum number of entries (default 100)
  pub limit: Option<usize>,

  /// `debug`, `info`, `success`, `warn`, `error` or `all`
  pub level: Option<String>,
}

/// Response for /logs endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogsResponse {
  pub logs: Vec<LogEntry>,
}

pub type LogEntry = journal::LogEntry;

// AI Endpoints
// ============

/// Request for /api/ai/process
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProcessRequest {
  #[serde(flatten)]
  pub input: AiInput,

  /// Prior conversation turns
  #[serde(default)]
  pub context: Option<Vec<Value>>,
}

// Placeholder Endpoints
// =====================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EmotionAnalysisStub {
  pub status: String,
  pub emotion: String,
  pub confidence: f64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NlpProcessQuery {
  pub text: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NlpProcessStub {
  pub status: String,
  pub intent: String,
  pub entities: Vec<Value>,
  pub sentiment: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WalletQuery {
  pub wallet_address: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WalletConnection {
  pub status: String,
  pub address: String,
  pub network: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TransactionsStub {
  pub status: String,
  pub transactions: Vec<Value>,
}

/// Body of /api/analytics/log
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UserInteraction {
  pub user_id: String,
  pub interaction_type: String,
  pub data: Map<String, Value>,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct InteractionLogged {
  pub status: String,
  pub interaction_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsStats {
  pub active_users: u64,
  pub total_interactions: u64,
  pub emotion_distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
  pub status: String,
}

// Helper Functions
// ================

fn version_info() -> VersionInfo {
  let version = env!("CARGO_PKG_VERSION");
  VersionInfo {
    latest: version.to_string(),
    requested: version.to_string(),
    resolved: version.to_string(),
  }
}

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: version_info(), transaction_id, errors: Vec::new(), data }
  }

  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: version_info(), transaction_id, errors, data: () }
  }
}

impl ApiError {
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string(), context: Value::Null }
  }
}
