#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use image::{ImageFormat, Rgb, RgbImage};
use journal::DaemonLog;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sasok::ai::imaging::encode_base64;
use sasok::ai::labels::LabelScore;
use sasok::ai::models::{EmotionClassifier, FaceBox, FaceDetector, TextClassifier, ZeroShotClassifier};
use sasok::ai::{AiManager, ModelProvider};
use sasok::config::Config;
use sasok::error::{AiError, Result};
use sasok::server::{create_router, AppState};

/// Classifier output with `happy` on top
pub const HAPPY_SCORES: [f32; 7] = [0.05, 0.05, 0.05, 0.6, 0.1, 0.1, 0.05];

/// Deterministic stand-ins for the pretrained models
#[derive(Clone, Default)]
pub struct FakeModels {
  pub faces: Vec<FaceBox>,
  /// Number of initial face detector loads that fail
  pub failing_loads: usize,
  pub loads: Arc<AtomicUsize>,
}

impl FakeModels {
  pub fn with_faces(faces: Vec<FaceBox>) -> Self {
    Self { faces, ..Self::default() }
  }

  pub fn detector_loads(&self) -> usize {
    self.loads.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl ModelProvider for FakeModels {
  async fn face_detector(&self) -> Result<Box<dyn FaceDetector>> {
    let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
    if attempt < self.failing_loads {
      return Err(AiError::unavailable("Face detector", "warming up"));
    }
    Ok(Box::new(FixedFaces(self.faces.clone())))
  }

  async fn emotion_classifier(&self) -> Result<Box<dyn EmotionClassifier>> {
    Ok(Box::new(FixedScores(HAPPY_SCORES.to_vec())))
  }

  async fn text_emotion_classifier(&self) -> Result<Box<dyn TextClassifier>> {
    Ok(Box::new(KeywordEmotion))
  }

  async fn intent_classifier(&self) -> Result<Box<dyn ZeroShotClassifier>> {
    Ok(Box::new(QuestionMarkIntent))
  }
}

struct FixedFaces(Vec<FaceBox>);

impl FaceDetector for FixedFaces {
  fn detect(&mut self, _image: &RgbImage) -> Result<Vec<FaceBox>> {
    Ok(self.0.clone())
  }
}

struct FixedScores(Vec<f32>);

impl EmotionClassifier for FixedScores {
  fn predict(&mut self, pixels: &[f32]) -> Result<Vec<f32>> {
    assert_eq!(pixels.len(), 48 * 48);
    Ok(self.0.clone())
  }

  fn input_side(&self) -> u32 {
    48
  }

  fn input_shape(&self) -> Vec<usize> {
    vec![1, 48, 48, 1]
  }
}

struct KeywordEmotion;

impl TextClassifier for KeywordEmotion {
  fn classify(&mut self, text: &str) -> Result<Vec<LabelScore>> {
    let joyful = text.to_lowercase().contains("love");
    let (top, rest) = if joyful { ("joy", "neutral") } else { ("neutral", "joy") };
    Ok(vec![LabelScore::new(top, 0.9), LabelScore::new(rest, 0.1)])
  }

  fn model_id(&self) -> String {
    "fake/emotion".to_string()
  }
}

struct QuestionMarkIntent;

impl ZeroShotClassifier for QuestionMarkIntent {
  fn classify(&mut self, text: &str, candidate_labels: &[String]) -> Result<Vec<LabelScore>> {
    let top = if text.trim_end().ends_with('?') { "question" } else { "statement" };
    let rest = 0.3 / (candidate_labels.len().max(2) - 1) as f32;

    let mut scores: Vec<LabelScore> = candidate_labels
      .iter()
      .map(|label| LabelScore::new(label.clone(), if label == top { 0.7 } else { rest }))
      .collect();
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(scores)
  }

  fn model_id(&self) -> String {
    "fake/nli".to_string()
  }
}

/// Uniform grey PNG, base64 encoded
pub fn png_base64(width: u32, height: u32) -> String {
  let image = RgbImage::from_pixel(width, height, Rgb([120, 120, 120]));
  let mut bytes = Vec::new();
  image::DynamicImage::ImageRgb8(image)
    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
    .unwrap();
  encode_base64(&bytes)
}

pub fn manager(data_dir: &Path, models: FakeModels) -> AiManager {
  AiManager::new(&Config::default(), data_dir, Arc::new(models)).unwrap()
}

pub fn app(data_dir: &Path, models: FakeModels) -> Router {
  let logs = DaemonLog::open_with_silent(data_dir.join("server.logs.jsonl"), true).unwrap();
  create_router(AppState::new(manager(data_dir, models), logs))
}
