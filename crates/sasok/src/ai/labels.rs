//! Fixed label vocabularies

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Candidate labels offered to the zero-shot intent classifier by default
pub const DEFAULT_INTENT_LABELS: [&str; 4] = ["question", "statement", "command", "request"];

/// The seven classes of the face emotion classifier, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FaceEmotion {
  Angry,
  Disgust,
  Fear,
  Happy,
  Sad,
  Surprise,
  Neutral,
}

impl FaceEmotion {
  /// Classifier output order
  pub const ALL: [FaceEmotion; 7] = [
    FaceEmotion::Angry,
    FaceEmotion::Disgust,
    FaceEmotion::Fear,
    FaceEmotion::Happy,
    FaceEmotion::Sad,
    FaceEmotion::Surprise,
    FaceEmotion::Neutral,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      FaceEmotion::Angry => "angry",
      FaceEmotion::Disgust => "disgust",
      FaceEmotion::Fear => "fear",
      FaceEmotion::Happy => "happy",
      FaceEmotion::Sad => "sad",
      FaceEmotion::Surprise => "surprise",
      FaceEmotion::Neutral => "neutral",
    }
  }

  pub fn names() -> Vec<String> {
    Self::ALL.iter().map(|e| e.as_str().to_string()).collect()
  }
}

impl std::fmt::Display for FaceEmotion {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FaceEmotion {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("unknown face emotion '{s}'"))
  }
}

/// A label with its classifier score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LabelScore {
  pub label: String,
  pub score: f32,
}

impl LabelScore {
  pub fn new(label: impl Into<String>, score: f32) -> Self {
    Self { label: label.into(), score }
  }
}
