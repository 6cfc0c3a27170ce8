//! Top-level orchestration of the analysis pipeline
//!
//! `AiManager` owns the lazily loaded components and the learning log. Every
//! public operation returns an [`Outcome`]; failures never escape as errors.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::ai::emotion_detector::{DetectorInfo, EmotionDetector, FaceAnalysis};
use crate::ai::imaging::decode_image;
use crate::ai::learning::{
  LearningStats, LearningSystem, LoggedInteraction, TrainingComponent, TrainingReport,
};
use crate::ai::nlp::{Context, IntentAnalysis, ModelStats, NlpInfo, NlpProcessor, ResponseData};
use crate::ai::outcome::Outcome;
use crate::ai::provider::ModelProvider;
use crate::config::Config;
use crate::error::{AiError, Result};

const FEEDBACK_MESSAGE: &str = "Feedback processed successfully";

// Inputs
// ======

/// Payload accepted by [`AiManager::process_input`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AiInput {
  /// `image`, `text` or `video_frame`
  #[serde(rename = "type", default = "default_input_type")]
  pub input_type: String,

  /// Text, or base64 image data (a data-URL prefix is allowed)
  #[serde(default)]
  pub data: Option<String>,
}

fn default_input_type() -> String {
  InputKind::Text.as_str().to_string()
}

impl AiInput {
  pub fn new(input_type: impl Into<String>, data: impl Into<String>) -> Self {
    Self { input_type: input_type.into(), data: Some(data.into()) }
  }

  pub fn text(text: impl Into<String>) -> Self {
    Self::new(InputKind::Text.as_str(), text)
  }

  pub fn image(base64: impl Into<String>) -> Self {
    Self::new(InputKind::Image.as_str(), base64)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
  Image,
  Text,
  VideoFrame,
}

impl InputKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      InputKind::Image => "image",
      InputKind::Text => "text",
      InputKind::VideoFrame => "video_frame",
    }
  }
}

impl FromStr for InputKind {
  type Err = AiError;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s {
      "image" => Ok(InputKind::Image),
      "text" => Ok(InputKind::Text),
      "video_frame" => Ok(InputKind::VideoFrame),
      other => Err(AiError::UnsupportedInputType(other.to_string())),
    }
  }
}

// Results
// =======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnalysis {
  pub nlp_analysis: IntentAnalysis,
  pub response: ResponseData,
  pub timestamp: DateTime<Utc>,
}

/// Payload of a dispatched input, shaped by the handler that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
  Faces(FaceAnalysis),
  Text(TextAnalysis),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
  pub results: BTreeMap<TrainingComponent, TrainingReport>,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NlpStatus {
  #[serde(flatten)]
  pub info: NlpInfo,
  pub stats: Option<ModelStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
  pub emotion_detector: DetectorInfo,
  pub nlp_processor: NlpStatus,
  pub learning_system: LearningStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
  pub components: Components,
  pub status: String,
  pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAck {
  pub message: String,
  pub feedback_id: Uuid,
}

// AI Manager
// ==========

pub struct AiManager {
  provider: Arc<dyn ModelProvider>,
  candidate_labels: Vec<String>,
  record_raw_input: bool,
  detector: OnceCell<Arc<EmotionDetector>>,
  nlp: OnceCell<Arc<NlpProcessor>>,
  learning: LearningSystem,
}

impl AiManager {
  /// Open the learning log in `data_dir`; models load on first use
  pub fn new(config: &Config, data_dir: &Path, provider: Arc<dyn ModelProvider>) -> Result<Self> {
    let learning = LearningSystem::open(data_dir)?;
    tracing::info!("AI components initialized (data dir: {})", data_dir.display());

    Ok(Self {
      provider,
      candidate_labels: config.text.candidate_labels.clone(),
      record_raw_input: config.learning.record_raw_input,
      detector: OnceCell::new(),
      nlp: OnceCell::new(),
      learning,
    })
  }

  /// Route an input by its `type` and log the result for learning
  pub async fn process_input(
    &self,
    input: &AiInput,
    context: Option<&Context>,
  ) -> Outcome<AnalysisResult> {
    let kind = match input.input_type.parse::<InputKind>() {
      Ok(kind) => kind,
      Err(e) => {
        tracing::error!("Error processing input: {e}");
        return Outcome::failed(e);
      }
    };
    let Some(data) = input.data.as_deref() else {
      tracing::error!("Error processing input: missing data");
      return Outcome::failed(AiError::MissingField("data"));
    };

    let outcome = match kind {
      InputKind::Image => self.process_image(data).await.map(AnalysisResult::Faces),
      InputKind::Text => self.process_text(data, context).await.map(AnalysisResult::Text),
      InputKind::VideoFrame => self.process_video_frame(data).await.map(AnalysisResult::Faces),
    };

    self.log_interaction(kind, input, &outcome).await;
    outcome
  }

  pub async fn process_image(&self, image_data: &str) -> Outcome<FaceAnalysis> {
    let detector = match self.emotion_detector().await {
      Ok(detector) => detector,
      Err(e) => return failed("processing image", e),
    };

    let image_data = image_data.to_string();
    run_blocking(move || detector.process_image(&image_data)).await
  }

  /// Intent analysis plus a generated response
  pub async fn process_text(&self, text: &str, context: Option<&Context>) -> Outcome<TextAnalysis> {
    let nlp = match self.nlp_processor().await {
      Ok(nlp) => nlp,
      Err(e) => return failed("processing text", e),
    };

    let text = text.to_string();
    let context = context.map(<[Value]>::to_vec);
    run_blocking(move || {
      let context = context.as_deref();
      let analysis = nlp.process_text(&text, context).and_then(|nlp_analysis| {
        let response = nlp.generate_response(&text, context)?;
        Ok(TextAnalysis { nlp_analysis, response, timestamp: Utc::now() })
      });
      if let Err(e) = &analysis {
        tracing::error!("Error processing text: {e}");
      }
      Outcome::from(analysis)
    })
    .await
  }

  /// Decode a base64 frame and run face emotion analysis on it
  pub async fn process_video_frame(&self, frame_data: &str) -> Outcome<FaceAnalysis> {
    let detector = match self.emotion_detector().await {
      Ok(detector) => detector,
      Err(e) => return failed("processing video frame", e),
    };

    let frame_data = frame_data.to_string();
    run_blocking(move || match decode_image(&frame_data) {
      Ok(frame) => detector.process_video_frame(&frame),
      Err(e) => failed("processing video frame", e),
    })
    .await
  }

  /// Persist one dispatched input with its outcome
  pub async fn log_interaction(
    &self,
    kind: InputKind,
    input: &AiInput,
    outcome: &Outcome<AnalysisResult>,
  ) -> Outcome<LoggedInteraction> {
    let result = async {
      let input = if self.record_raw_input {
        serde_json::to_value(input)?
      } else {
        json!({
          "type": input.input_type,
          "data_length": input.data.as_ref().map(String::len),
        })
      };
      let result = serde_json::to_value(outcome)?;
      self.learning.log_interaction(kind.as_str(), input, result).await
    }
    .await;

    if let Err(e) = &result {
      tracing::error!("Error logging interaction: {e}");
    }
    result.into()
  }

  /// Run a (bookkeeping-only) training pass for every component
  pub async fn train_models(&self) -> Outcome<TrainingSummary> {
    let result = async {
      let mut results = BTreeMap::new();
      for component in TrainingComponent::ALL {
        results.insert(component, self.learning.train_models(component.as_str()).await?);
      }
      Ok::<_, AiError>(TrainingSummary { results, timestamp: Utc::now() })
    }
    .await;

    outcome_logged("training models", result)
  }

  /// Component report; never triggers model loading
  pub async fn system_status(&self) -> Outcome<SystemStatus> {
    let emotion_detector =
      self.detector.get().map(|d| d.model_info()).unwrap_or_else(DetectorInfo::unloaded);
    let nlp_processor = match self.nlp.get() {
      Some(nlp) => NlpStatus { info: nlp.model_info(), stats: Some(nlp.model_stats()) },
      None => NlpStatus { info: NlpProcessor::unloaded_info(&self.candidate_labels), stats: None },
    };

    let result = self.learning.learning_stats().await.map(|learning_system| SystemStatus {
      components: Components { emotion_detector, nlp_processor, learning_system },
      status: "operational".to_string(),
      last_updated: Utc::now(),
    });

    outcome_logged("getting system status", result)
  }

  /// Log feedback and queue it as a training sample
  pub async fn process_feedback(&self, feedback: Value) -> Outcome<FeedbackAck> {
    let result = async {
      self.learning.update_training_data(&feedback).await?;
      if let Some(nlp) = self.nlp.get() {
        nlp.update_learning(&feedback);
      }
      let feedback_id = self.learning.log_feedback(feedback).await?;
      Ok::<_, AiError>(FeedbackAck { message: FEEDBACK_MESSAGE.to_string(), feedback_id })
    }
    .await;

    outcome_logged("processing feedback", result)
  }

  pub fn learning(&self) -> &LearningSystem {
    &self.learning
  }

  async fn emotion_detector(&self) -> Result<Arc<EmotionDetector>> {
    self
      .detector
      .get_or_try_init(|| async {
        let detector = self.provider.face_detector().await?;
        let classifier = self.provider.emotion_classifier().await?;
        tracing::info!("Emotion detector ready");
        Ok::<_, AiError>(Arc::new(EmotionDetector::new(detector, classifier)))
      })
      .await
      .cloned()
  }

  async fn nlp_processor(&self) -> Result<Arc<NlpProcessor>> {
    self
      .nlp
      .get_or_try_init(|| async {
        let emotion = self.provider.text_emotion_classifier().await?;
        let intent = self.provider.intent_classifier().await?;
        tracing::info!("NLP models loaded successfully");
        Ok::<_, AiError>(Arc::new(NlpProcessor::new(emotion, intent, self.candidate_labels.clone())))
      })
      .await
      .cloned()
  }
}

fn failed<T>(action: &str, error: AiError) -> Outcome<T> {
  tracing::error!("Error {action}: {error}");
  Outcome::failed(error)
}

fn outcome_logged<T>(action: &str, result: Result<T>) -> Outcome<T> {
  match result {
    Ok(data) => Outcome::ok(data),
    Err(e) => failed(action, e),
  }
}

/// Inference is CPU bound; keep it off the async workers
async fn run_blocking<T, F>(work: F) -> Outcome<T>
where
  T: Send + 'static,
  F: FnOnce() -> Outcome<T> + Send + 'static,
{
  match tokio::task::spawn_blocking(work).await {
    Ok(outcome) => outcome,
    Err(e) => failed("running inference task", AiError::inference(e)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ai::provider::UnavailableModels;
  use tempfile::TempDir;

  fn manager(dir: &TempDir) -> AiManager {
    let provider = Arc::new(UnavailableModels::new("ML features not available"));
    AiManager::new(&Config::default(), dir.path(), provider).unwrap()
  }

  #[test]
  fn test_input_type_defaults_to_text() {
    let input: AiInput = serde_json::from_value(json!({ "data": "hello" })).unwrap();
    assert_eq!(input, AiInput::text("hello"));
  }

  #[test]
  fn test_input_kind_parsing() {
    assert_eq!("video_frame".parse::<InputKind>().unwrap(), InputKind::VideoFrame);
    let err = "audio".parse::<InputKind>().unwrap_err();
    assert_eq!(err.to_string(), "Unsupported input type: audio");
  }

  #[tokio::test]
  async fn test_unsupported_type_is_rejected_without_logging() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);

    let outcome = manager.process_input(&AiInput::new("audio", "..."), None).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.error_message(), Some("Unsupported input type: audio"));
    assert_eq!(manager.learning().learning_stats().await.unwrap().total_interactions, 0);
  }

  #[tokio::test]
  async fn test_missing_data_is_an_error() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);
    let input = AiInput { input_type: "image".to_string(), data: None };

    let outcome = manager.process_input(&input, None).await;

    assert_eq!(outcome.error_message(), Some("Missing required field: data"));
  }

  #[tokio::test]
  async fn test_unavailable_models_fail_and_are_logged() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);

    let outcome = manager.process_input(&AiInput::text("hello"), None).await;

    assert_eq!(
      outcome.error_message(),
      Some("Emotion analyzer not available: ML features not available")
    );
    let stats = manager.learning().learning_stats().await.unwrap();
    assert_eq!(stats.total_interactions, 1);
    assert_eq!(stats.interactions_by_type.get("text"), Some(&1));
  }

  #[tokio::test]
  async fn test_status_does_not_load_models() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);

    let status = manager.system_status().await.into_result().unwrap();

    assert_eq!(status.status, "operational");
    assert!(!status.components.emotion_detector.model_loaded);
    assert!(!status.components.nlp_processor.info.models_loaded);
    assert!(status.components.nlp_processor.stats.is_none());
  }

  #[tokio::test]
  async fn test_feedback_and_training() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);

    let ack = manager.process_feedback(json!({ "rating": 5 })).await.into_result().unwrap();
    assert_eq!(ack.message, "Feedback processed successfully");

    let summary = manager.train_models().await.into_result().unwrap();
    assert_eq!(summary.results.len(), 2);
    let report = &summary.results[&TrainingComponent::NlpProcessing];
    assert_eq!(report.samples_available, 1);
    assert!(report.updated);

    let stats = manager.learning().learning_stats().await.unwrap();
    assert_eq!(stats.feedback_count, 1);
    assert_eq!(stats.training_samples, 1);
  }

  #[tokio::test]
  async fn test_redacted_input_keeps_length_only() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.learning.record_raw_input = false;
    let provider = Arc::new(UnavailableModels::new("offline"));
    let manager = AiManager::new(&config, dir.path(), provider).unwrap();

    manager.process_input(&AiInput::text("secret"), None).await;

    let records = manager.learning().interactions(10).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].input, json!({ "type": "text", "data_length": 6 }));
  }
}
