//! Uniform success/failure envelope for pipeline results

use serde::{Deserialize, Serialize};

use crate::error::AiError;

/// `{ "success": true, ...payload }` or `{ "success": false, "error": "..." }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome<T> {
  pub success: bool,

  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub error: Option<String>,

  #[serde(flatten)]
  pub data: Option<T>,
}

impl<T> Outcome<T> {
  pub fn ok(data: T) -> Self {
    Self { success: true, error: None, data: Some(data) }
  }

  pub fn failed(error: impl std::fmt::Display) -> Self {
    Self { success: false, error: Some(error.to_string()), data: None }
  }

  pub fn is_success(&self) -> bool {
    self.success
  }

  /// Error text of a failed outcome
  pub fn error_message(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
    Outcome { success: self.success, error: self.error, data: self.data.map(f) }
  }

  pub fn into_result(self) -> Result<T, String> {
    match (self.success, self.data) {
      (true, Some(data)) => Ok(data),
      _ => Err(self.error.unwrap_or_else(|| "unknown error".to_string())),
    }
  }
}

impl<T> From<Result<T, AiError>> for Outcome<T> {
  fn from(result: Result<T, AiError>) -> Self {
    match result {
      Ok(data) => Outcome::ok(data),
      Err(e) => Outcome::failed(e),
    }
  }
}
