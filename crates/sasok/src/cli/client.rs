//! HTTP client for the SASOK REST API

use anyhow::{anyhow, Result};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;

use crate::ai::emotion_detector::FaceAnalysis;
use crate::ai::manager::{AiInput, FeedbackAck, SystemStatus, TextAnalysis, TrainingSummary};
use crate::ai::Outcome;
use crate::server::types::{
  BaseResponse, HealthResponse, LogEntry, LogsResponse, ProcessRequest,
};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Base URL of the server (e.g., "http://localhost:8000")
  pub base_url: String,
  /// Request timeout in seconds
  pub timeout_secs: u64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self { base_url: DEFAULT_SERVER_URL.to_string(), timeout_secs: 30 }
  }
}

pub struct SasokClient {
  client: Client,
  config: ClientConfig,
}

impl SasokClient {
  pub fn with_config(config: ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str {
    &self.config.base_url
  }

  pub async fn health(&self) -> Result<HealthResponse> {
    self.send(self.client.get(self.url("/health"))).await
  }

  pub async fn status(&self) -> Result<Outcome<SystemStatus>> {
    let response: BaseResponse<Outcome<SystemStatus>> =
      self.send(self.client.get(self.url("/api/ai/status"))).await?;
    Ok(response.data)
  }

  pub async fn analyze_text(&self, text: &str) -> Result<Outcome<TextAnalysis>> {
    self.process(AiInput::text(text)).await
  }

  pub async fn analyze_image(&self, base64: String) -> Result<Outcome<FaceAnalysis>> {
    self.process(AiInput::image(base64)).await
  }

  pub async fn feedback(&self, feedback: &Value) -> Result<Outcome<FeedbackAck>> {
    self.post("/api/ai/feedback", feedback).await
  }

  pub async fn train(&self) -> Result<Outcome<TrainingSummary>> {
    self.post("/api/ai/train", &Value::Null).await
  }

  pub async fn logs(&self, limit: usize, level: &str) -> Result<Vec<LogEntry>> {
    let request =
      self.client.get(self.url("/logs")).query(&[("limit", limit.to_string()), ("level", level.to_string())]);
    let response: BaseResponse<LogsResponse> = self.send(request).await?;
    Ok(response.data.logs)
  }

  async fn process<T: DeserializeOwned>(&self, input: AiInput) -> Result<Outcome<T>> {
    self.post("/api/ai/process", &ProcessRequest { input, context: None }).await
  }

  async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<Outcome<T>> {
    let response: BaseResponse<Outcome<T>> =
      self.send(self.client.post(self.url(path)).json(body)).await?;
    Ok(response.data)
  }

  async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
    let response = timeout(Duration::from_secs(self.config.timeout_secs), request.send())
      .await
      .map_err(|_| anyhow!("Request to {} timed out", self.config.base_url))?
      .map_err(|e| anyhow!("Could not reach SASOK server at {}: {}", self.config.base_url, e))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await?;
      return Err(anyhow!("Server returned HTTP {}: {}", status, error_summary(&body)));
    }

    Ok(response.json().await?)
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }
}

/// Prefer the envelope's error messages over the raw body
fn error_summary(body: &str) -> String {
  match serde_json::from_str::<BaseResponse<()>>(body) {
    Ok(envelope) if !envelope.errors.is_empty() => {
      envelope.errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ")
    }
    _ => body.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_url_joins_without_double_slash() {
    let client = SasokClient::with_config(ClientConfig {
      base_url: "http://localhost:8000/".to_string(),
      timeout_secs: 5,
    })
    .unwrap();

    assert_eq!(client.url("/health"), "http://localhost:8000/health");
  }

  #[test]
  fn test_error_summary_reads_envelope() {
    let body = serde_json::json!({
      "versioning": { "latest": "0.1.0", "requested": "0.1.0", "resolved": "0.1.0" },
      "transaction_id": "00000000-0000-0000-0000-000000000000",
      "errors": [{ "key": "invalid_log_level", "message": "Unknown log level: loud" }]
    })
    .to_string();

    assert_eq!(error_summary(&body), "Unknown log level: loud");
    assert_eq!(error_summary("plain text"), "plain text");
  }
}
