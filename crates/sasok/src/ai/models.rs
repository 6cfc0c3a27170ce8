//! Model seams
//!
//! The pipeline only talks to models through these traits, so the pretrained
//! backends (see `ai::onnx`) can be swapped for fakes in tests.

use image::RgbImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ai::labels::LabelScore;
use crate::error::Result;

/// Face bounding box in source image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FaceBox {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

impl FaceBox {
  pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
    Self { x, y, width, height }
  }
}

/// Locates faces in an RGB image
#[cfg_attr(test, mockall::automock)]
pub trait FaceDetector: Send {
  fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>>;
}

/// Scores a normalised grayscale face crop over the seven face emotions
#[cfg_attr(test, mockall::automock)]
pub trait EmotionClassifier: Send {
  /// `pixels` is a row-major `side x side` crop with values in `[0, 1]`
  fn predict(&mut self, pixels: &[f32]) -> Result<Vec<f32>>;

  /// Edge length of the square input crop
  fn input_side(&self) -> u32;

  /// Full tensor shape fed to the model
  fn input_shape(&self) -> Vec<usize>;
}

/// Single-label text classification (e.g. emotion from text)
#[cfg_attr(test, mockall::automock)]
pub trait TextClassifier: Send {
  /// Scores for every label, highest first
  fn classify(&mut self, text: &str) -> Result<Vec<LabelScore>>;

  fn model_id(&self) -> String;
}

/// Zero-shot classification against caller-supplied labels
#[cfg_attr(test, mockall::automock)]
pub trait ZeroShotClassifier: Send {
  /// Scores for every candidate label, highest first
  fn classify(&mut self, text: &str, candidate_labels: &[String]) -> Result<Vec<LabelScore>>;

  fn model_id(&self) -> String;
}
