//! Loading of the pretrained models behind the pipeline traits

use async_trait::async_trait;
use std::sync::Arc;

use crate::ai::models::{EmotionClassifier, FaceDetector, TextClassifier, ZeroShotClassifier};
use crate::config::Config;
use crate::error::{AiError, Result};

/// Source of model instances; called lazily, once per component
#[async_trait]
pub trait ModelProvider: Send + Sync {
  async fn face_detector(&self) -> Result<Box<dyn FaceDetector>>;
  async fn emotion_classifier(&self) -> Result<Box<dyn EmotionClassifier>>;
  async fn text_emotion_classifier(&self) -> Result<Box<dyn TextClassifier>>;
  async fn intent_classifier(&self) -> Result<Box<dyn ZeroShotClassifier>>;
}

/// Provider used when the crate is built without inference support
pub struct UnavailableModels {
  reason: String,
}

impl UnavailableModels {
  pub fn new(reason: impl Into<String>) -> Self {
    Self { reason: reason.into() }
  }
}

#[async_trait]
impl ModelProvider for UnavailableModels {
  async fn face_detector(&self) -> Result<Box<dyn FaceDetector>> {
    Err(AiError::unavailable("Face detector", &self.reason))
  }

  async fn emotion_classifier(&self) -> Result<Box<dyn EmotionClassifier>> {
    Err(AiError::unavailable("Emotion classifier", &self.reason))
  }

  async fn text_emotion_classifier(&self) -> Result<Box<dyn TextClassifier>> {
    Err(AiError::unavailable("Emotion analyzer", &self.reason))
  }

  async fn intent_classifier(&self) -> Result<Box<dyn ZeroShotClassifier>> {
    Err(AiError::unavailable("Intent classifier", &self.reason))
  }
}

/// ONNX-backed provider when `ml-features` is enabled
#[cfg(feature = "ml-features")]
pub fn default_provider(config: &Config) -> Arc<dyn ModelProvider> {
  Arc::new(crate::ai::onnx::OnnxModelProvider::new(config.vision.clone(), config.text.clone()))
}

/// No-op provider when ML features are not available
#[cfg(not(feature = "ml-features"))]
pub fn default_provider(_config: &Config) -> Arc<dyn ModelProvider> {
  Arc::new(UnavailableModels::new("ML features not available"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_unavailable_models_report_reason() {
    let provider = UnavailableModels::new("ML features not available");
    let err = provider.face_detector().await.err().unwrap();
    assert_eq!(err.to_string(), "Face detector not available: ML features not available");
    assert!(provider.intent_classifier().await.is_err());
  }
}
