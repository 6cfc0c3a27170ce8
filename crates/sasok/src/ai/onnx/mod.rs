//! ONNX Runtime backends for the model traits
//!
//! Vision models are read from local files; text models are fetched from the
//! Hugging Face hub on first use and cached by `hf-hub`.

pub mod text;
pub mod vision;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ort::{
  execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch},
  session::Session,
  value::Value,
};
use std::path::Path;

use crate::ai::models::{EmotionClassifier, FaceDetector, TextClassifier, ZeroShotClassifier};
use crate::ai::provider::ModelProvider;
use crate::config::{TextConfig, VisionConfig};
use crate::error::AiError;

pub use text::{OnnxTextClassifier, OnnxZeroShotClassifier};
pub use vision::{OnnxEmotionClassifier, OnnxFaceDetector};

/// Trait for extracting tensor data - keeps shape handling testable without a session
pub(crate) trait TensorData {
  fn extract_f32_data(&self) -> Result<(&[i64], &[f32])>;
}

#[cfg(not(tarpaulin_include))]
impl TensorData for Value {
  fn extract_f32_data(&self) -> Result<(&[i64], &[f32])> {
    let (shape, data) = self.try_extract_tensor::<f32>()?;
    Ok((shape.as_ref(), data))
  }
}

/// Build a CPU session for a model file
pub(crate) fn load_session(model_path: &Path) -> Result<Session> {
  if !model_path.exists() {
    return Err(anyhow!("model file {} does not exist", model_path.display()));
  }

  let providers: Vec<ExecutionProviderDispatch> = vec![CPUExecutionProvider::default().into()];
  let session =
    Session::builder()?.with_execution_providers(providers)?.commit_from_file(model_path)?;

  Ok(session)
}

pub(crate) fn input_names(session: &Session) -> Vec<String> {
  session.inputs.iter().map(|input| input.name.to_string()).collect()
}

pub(crate) fn output_names(session: &Session) -> Vec<String> {
  session.outputs.iter().map(|output| output.name.to_string()).collect()
}

/// Loads every model through ONNX Runtime
pub struct OnnxModelProvider {
  vision: VisionConfig,
  text: TextConfig,
}

impl OnnxModelProvider {
  pub fn new(vision: VisionConfig, text: TextConfig) -> Self {
    Self { vision, text }
  }
}

#[async_trait]
impl ModelProvider for OnnxModelProvider {
  async fn face_detector(&self) -> crate::error::Result<Box<dyn FaceDetector>> {
    let detector = OnnxFaceDetector::load(&self.vision)
      .map_err(|e| AiError::unavailable("Face detector", format!("{e:#}")))?;
    tracing::info!("Face detector loaded from {}", self.vision.face_detector_model.display());
    Ok(Box::new(detector))
  }

  async fn emotion_classifier(&self) -> crate::error::Result<Box<dyn EmotionClassifier>> {
    let classifier = OnnxEmotionClassifier::load(&self.vision)
      .map_err(|e| AiError::unavailable("Emotion classifier", format!("{e:#}")))?;
    tracing::info!("Emotion detection model loaded from {}", self.vision.emotion_model.display());
    Ok(Box::new(classifier))
  }

  async fn text_emotion_classifier(&self) -> crate::error::Result<Box<dyn TextClassifier>> {
    let classifier = OnnxTextClassifier::load(&self.text.emotion_model)
      .await
      .map_err(|e| AiError::unavailable("Emotion analyzer", format!("{e:#}")))?;
    Ok(Box::new(classifier))
  }

  async fn intent_classifier(&self) -> crate::error::Result<Box<dyn ZeroShotClassifier>> {
    let classifier =
      OnnxZeroShotClassifier::load(&self.text.intent_model, &self.text.hypothesis_template)
        .await
        .map_err(|e| AiError::unavailable("Intent classifier", format!("{e:#}")))?;
    Ok(Box::new(classifier))
  }
}
