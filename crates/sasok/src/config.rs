//! Configuration management for the SASOK backend
//!
//! Loads server, model and learning settings from JSON. Every field has a
//! default so a partial file (or no file at all) yields a working setup.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "SASOK_DATA_DIR";

const CONFIG_PATHS: [&str; 3] = ["sasok.json", ".sasok.json", ".sasok/config.json"];

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Failed to read config file {path}: {source}")]
  Read { path: PathBuf, source: std::io::Error },

  #[error("Failed to parse config file {path}: {source}")]
  Parse { path: PathBuf, source: serde_json::Error },

  #[error("Invalid configuration: {0}")]
  Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub vision: VisionConfig,
  #[serde(default)]
  pub text: TextConfig,
  #[serde(default)]
  pub learning: LearningConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
  /// Address the REST server binds to
  #[serde(default = "default_bind")]
  pub bind: SocketAddr,
  /// Directory for interaction logs and daemon logs
  #[serde(default)]
  pub data_dir: Option<PathBuf>,
}

/// Tensor layout expected by the emotion classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
  /// `[1, side, side, 1]`, the Keras default
  Nhwc,
  /// `[1, 1, side, side]`
  Nchw,
}

/// Face detection and face emotion classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
  #[serde(default = "default_face_detector_model")]
  pub face_detector_model: PathBuf,
  #[serde(default = "default_emotion_model")]
  pub emotion_model: PathBuf,
  #[serde(default = "default_detector_input_width")]
  pub detector_input_width: u32,
  #[serde(default = "default_detector_input_height")]
  pub detector_input_height: u32,
  /// Minimum face score kept by the detector
  #[serde(default = "default_confidence_threshold")]
  pub confidence_threshold: f32,
  /// Boxes overlapping a better box by more than this are suppressed
  #[serde(default = "default_iou_threshold")]
  pub iou_threshold: f32,
  /// Smallest accepted face edge, in source pixels
  #[serde(default = "default_min_face_size")]
  pub min_face_size: u32,
  /// Edge length of the square grayscale classifier input
  #[serde(default = "default_classifier_input_size")]
  pub classifier_input_size: u32,
  #[serde(default = "default_classifier_layout")]
  pub classifier_layout: TensorLayout,
}

/// A pretrained model fetched from the Hugging Face hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubModel {
  pub repo: String,
  #[serde(default = "default_onnx_file")]
  pub model_file: String,
  #[serde(default = "default_tokenizer_file")]
  pub tokenizer_file: String,
}

/// Text emotion and intent classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
  #[serde(default = "default_text_emotion_model")]
  pub emotion_model: HubModel,
  #[serde(default = "default_intent_model")]
  pub intent_model: HubModel,
  #[serde(default = "default_candidate_labels")]
  pub candidate_labels: Vec<String>,
  /// NLI hypothesis, `{}` is replaced by the candidate label
  #[serde(default = "default_hypothesis_template")]
  pub hypothesis_template: String,
}

/// Interaction logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
  /// Keep raw request payloads (e.g. base64 images) in interaction records
  #[serde(default = "default_record_raw_input")]
  pub record_raw_input: bool,
}

// Defaults
fn default_bind() -> SocketAddr {
  SocketAddr::from(([0, 0, 0, 0], 8000))
}
fn default_face_detector_model() -> PathBuf {
  PathBuf::from("models/face_detector.onnx")
}
fn default_emotion_model() -> PathBuf {
  PathBuf::from("models/emotion_model.onnx")
}
fn default_detector_input_width() -> u32 {
  320
}
fn default_detector_input_height() -> u32 {
  240
}
fn default_confidence_threshold() -> f32 {
  0.7
}
fn default_iou_threshold() -> f32 {
  0.3
}
fn default_min_face_size() -> u32 {
  30
}
fn default_classifier_input_size() -> u32 {
  48
}
fn default_classifier_layout() -> TensorLayout {
  TensorLayout::Nhwc
}
fn default_onnx_file() -> String {
  "onnx/model.onnx".to_string()
}
fn default_tokenizer_file() -> String {
  "tokenizer.json".to_string()
}
fn default_text_emotion_model() -> HubModel {
  HubModel {
    repo: "j-hartmann/emotion-english-distilroberta-base".to_string(),
    model_file: default_onnx_file(),
    tokenizer_file: default_tokenizer_file(),
  }
}
fn default_intent_model() -> HubModel {
  HubModel {
    repo: "facebook/bart-large-mnli".to_string(),
    model_file: default_onnx_file(),
    tokenizer_file: default_tokenizer_file(),
  }
}
fn default_candidate_labels() -> Vec<String> {
  crate::ai::labels::DEFAULT_INTENT_LABELS.iter().map(|l| l.to_string()).collect()
}
fn default_hypothesis_template() -> String {
  "This example is {}.".to_string()
}
fn default_record_raw_input() -> bool {
  true
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self { bind: default_bind(), data_dir: None }
  }
}

impl Default for VisionConfig {
  fn default() -> Self {
    Self {
      face_detector_model: default_face_detector_model(),
      emotion_model: default_emotion_model(),
      detector_input_width: default_detector_input_width(),
      detector_input_height: default_detector_input_height(),
      confidence_threshold: default_confidence_threshold(),
      iou_threshold: default_iou_threshold(),
      min_face_size: default_min_face_size(),
      classifier_input_size: default_classifier_input_size(),
      classifier_layout: default_classifier_layout(),
    }
  }
}

impl Default for TextConfig {
  fn default() -> Self {
    Self {
      emotion_model: default_text_emotion_model(),
      intent_model: default_intent_model(),
      candidate_labels: default_candidate_labels(),
      hypothesis_template: default_hypothesis_template(),
    }
  }
}

impl Default for LearningConfig {
  fn default() -> Self {
    Self { record_raw_input: default_record_raw_input() }
  }
}

impl Config {
  /// Load configuration from a file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let config: Config = serde_json::from_str(&content)
      .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
    config.validate()?;
    Ok(config)
  }

  /// Load from an explicit path, the first config file found in the current directory, or defaults
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    if let Some(path) = explicit {
      return Self::load_from_file(path);
    }

    for path in CONFIG_PATHS {
      if Path::new(path).exists() {
        tracing::info!("Loading configuration from {path}");
        return Self::load_from_file(path);
      }
    }

    Ok(Self::default())
  }

  /// Check value ranges that serde cannot express
  pub fn validate(&self) -> Result<(), ConfigError> {
    let vision = &self.vision;
    for (name, value) in
      [("confidence_threshold", vision.confidence_threshold), ("iou_threshold", vision.iou_threshold)]
    {
      if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid(format!("vision.{name} must be within [0, 1], got {value}")));
      }
    }

    if vision.detector_input_width == 0
      || vision.detector_input_height == 0
      || vision.classifier_input_size == 0
    {
      return Err(ConfigError::Invalid("vision input sizes must be positive".to_string()));
    }

    if self.text.candidate_labels.is_empty() {
      return Err(ConfigError::Invalid("text.candidate_labels must not be empty".to_string()));
    }

    if !self.text.hypothesis_template.contains("{}") {
      return Err(ConfigError::Invalid(
        "text.hypothesis_template must contain a {} placeholder".to_string(),
      ));
    }

    Ok(())
  }

  /// Resolve the data directory: environment, then config, then `~/.sasok`
  pub fn data_dir(&self) -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
      if !dir.trim().is_empty() {
        return PathBuf::from(dir);
      }
    }

    self.server.data_dir.clone().unwrap_or_else(|| {
      dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp")).join(".sasok")
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_defaults_match_reference_setup() {
    let config = Config::default();
    assert_eq!(config.server.bind.port(), 8000);
    assert_eq!(config.vision.min_face_size, 30);
    assert_eq!(config.vision.classifier_input_size, 48);
    assert_eq!(config.vision.classifier_layout, TensorLayout::Nhwc);
    assert_eq!(config.text.candidate_labels, vec!["question", "statement", "command", "request"]);
    assert!(config.learning.record_raw_input);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_partial_file_fills_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sasok.json");
    std::fs::write(
      &path,
      r#"{ "server": { "bind": "127.0.0.1:9100" }, "vision": { "min_face_size": 64 } }"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.server.bind.to_string(), "127.0.0.1:9100");
    assert_eq!(config.vision.min_face_size, 64);
    assert_eq!(config.vision.confidence_threshold, 0.7);
    assert_eq!(config.text.intent_model.repo, "facebook/bart-large-mnli");
  }

  #[test]
  fn test_invalid_threshold_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sasok.json");
    std::fs::write(&path, r#"{ "vision": { "iou_threshold": 1.5 } }"#).unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("iou_threshold"));
  }

  #[test]
  fn test_template_without_placeholder_rejected() {
    let mut config = Config::default();
    config.text.hypothesis_template = "This example is a label.".to_string();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_missing_file_is_read_error() {
    let err = Config::load_from_file("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
  }

  #[test]
  fn test_configured_data_dir_used_without_env() {
    let mut config = Config::default();
    config.server.data_dir = Some(PathBuf::from("/srv/sasok"));
    if std::env::var(DATA_DIR_ENV).is_err() {
      assert_eq!(config.data_dir(), PathBuf::from("/srv/sasok"));
    }
  }
}
