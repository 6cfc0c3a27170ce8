use thiserror::Error;

/// Errors raised by the analysis pipeline
///
/// Handlers never surface these directly: every operation folds them into a
/// failed [`Outcome`](crate::ai::outcome::Outcome) whose `error` field is the
/// `Display` text below.
#[derive(Error, Debug)]
pub enum AiError {
  #[error("Unsupported input type: {0}")]
  UnsupportedInputType(String),

  #[error("Missing required field: {0}")]
  MissingField(&'static str),

  #[error("Invalid image data: {0}")]
  InvalidImage(String),

  #[error("No faces detected in the image")]
  NoFacesInImage,

  #[error("No faces detected in frame")]
  NoFacesInFrame,

  #[error("{component} not available: {reason}")]
  ModelUnavailable { component: &'static str, reason: String },

  #[error("Inference failed: {0}")]
  Inference(String),

  #[error("Unknown training component: {0}")]
  UnknownComponent(String),

  #[error("Storage error: {0}")]
  Storage(#[from] std::io::Error),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl AiError {
  pub fn unavailable(component: &'static str, reason: impl std::fmt::Display) -> Self {
    Self::ModelUnavailable { component, reason: reason.to_string() }
  }

  pub fn inference(reason: impl std::fmt::Display) -> Self {
    Self::Inference(reason.to_string())
  }

  pub fn invalid_image(reason: impl std::fmt::Display) -> Self {
    Self::InvalidImage(reason.to_string())
  }
}

pub type Result<T> = std::result::Result<T, AiError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_messages_match_api_contract() {
    assert_eq!(
      AiError::UnsupportedInputType("audio".to_string()).to_string(),
      "Unsupported input type: audio"
    );
    assert_eq!(AiError::NoFacesInImage.to_string(), "No faces detected in the image");
    assert_eq!(AiError::NoFacesInFrame.to_string(), "No faces detected in frame");
    assert_eq!(
      AiError::unavailable("Emotion classifier", "file not found").to_string(),
      "Emotion classifier not available: file not found"
    );
  }
}
