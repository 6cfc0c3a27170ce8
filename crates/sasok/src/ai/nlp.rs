//! Text emotion and intent analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::ai::labels::LabelScore;
use crate::ai::models::{TextClassifier, ZeroShotClassifier};
use crate::error::{AiError, Result};

pub const MODEL_VERSION: &str = "1.0.0";

const PLACEHOLDER_RESPONSE: &str = "I understand your message.";
const PLACEHOLDER_CONFIDENCE: f32 = 0.85;

/// Prior conversation turns, passed through untouched
pub type Context = [serde_json::Value];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionAnalysis {
  pub emotion: String,
  pub confidence: f32,
  pub all_emotions: Vec<LabelScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
  pub intent: String,
  pub confidence: f32,
  pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResponse {
  pub text: String,
  pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
  pub emotion_analysis: EmotionAnalysis,
  pub intent_analysis: IntentAnalysis,
  pub generated_response: GeneratedResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NlpInfo {
  pub emotion_model: Option<String>,
  pub intent_model: Option<String>,
  pub candidate_labels: Vec<String>,
  pub models_loaded: bool,
  pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
  /// Classifier invocations since load
  pub total_processed: u64,
  pub last_updated: DateTime<Utc>,
  pub model_version: String,
}

pub struct NlpProcessor {
  emotion: Mutex<Box<dyn TextClassifier>>,
  intent: Mutex<Box<dyn ZeroShotClassifier>>,
  candidate_labels: Vec<String>,
  processed: AtomicU64,
  loaded_at: DateTime<Utc>,
}

impl NlpProcessor {
  pub fn new(
    emotion: Box<dyn TextClassifier>,
    intent: Box<dyn ZeroShotClassifier>,
    candidate_labels: Vec<String>,
  ) -> Self {
    Self {
      emotion: Mutex::new(emotion),
      intent: Mutex::new(intent),
      candidate_labels,
      processed: AtomicU64::new(0),
      loaded_at: Utc::now(),
    }
  }

  /// Top text emotion with the full score list
  pub fn analyze_emotion(&self, text: &str) -> Result<EmotionAnalysis> {
    require_text(text)?;
    let scores = {
      let mut classifier =
        self.emotion.lock().map_err(|_| AiError::inference("emotion analyzer lock poisoned"))?;
      classifier.classify(text)?
    };
    self.processed.fetch_add(1, Ordering::Relaxed);

    let top = top_score(&scores)?;
    Ok(EmotionAnalysis { emotion: top.label.clone(), confidence: top.score, all_emotions: scores })
  }

  /// Intent classification against the configured candidate labels
  pub fn process_text(&self, text: &str, context: Option<&Context>) -> Result<IntentAnalysis> {
    require_text(text)?;
    if let Some(context) = context {
      tracing::debug!("classifying intent with {} context turns", context.len());
    }

    let scores = {
      let mut classifier =
        self.intent.lock().map_err(|_| AiError::inference("intent classifier lock poisoned"))?;
      classifier.classify(text, &self.candidate_labels)?
    };
    self.processed.fetch_add(1, Ordering::Relaxed);

    let top = top_score(&scores)?;
    Ok(IntentAnalysis { intent: top.label.clone(), confidence: top.score, text: text.to_string() })
  }

  /// Emotion + intent analysis with a fixed placeholder reply
  pub fn generate_response(&self, text: &str, context: Option<&Context>) -> Result<ResponseData> {
    let emotion_analysis = self.analyze_emotion(text)?;
    let intent_analysis = self.process_text(text, context)?;

    Ok(ResponseData {
      emotion_analysis,
      intent_analysis,
      generated_response: GeneratedResponse {
        text: PLACEHOLDER_RESPONSE.to_string(),
        confidence: PLACEHOLDER_CONFIDENCE,
      },
    })
  }

  /// Accept an interaction for future fine-tuning; no weights change
  pub fn update_learning(&self, interaction: &serde_json::Value) -> bool {
    let fields = interaction.as_object().map(|o| o.len()).unwrap_or(0);
    tracing::info!("Updating model with new interaction data ({fields} fields)");
    true
  }

  pub fn model_info(&self) -> NlpInfo {
    let emotion_model = self.emotion.lock().ok().map(|c| c.model_id());
    let intent_model = self.intent.lock().ok().map(|c| c.model_id());
    NlpInfo { emotion_model, intent_model, models_loaded: true, ..Self::unloaded_info(&self.candidate_labels) }
  }

  /// Info for a processor whose models have not been loaded (yet)
  pub fn unloaded_info(candidate_labels: &[String]) -> NlpInfo {
    NlpInfo {
      emotion_model: None,
      intent_model: None,
      candidate_labels: candidate_labels.to_vec(),
      models_loaded: false,
      version: MODEL_VERSION.to_string(),
    }
  }

  pub fn model_stats(&self) -> ModelStats {
    ModelStats {
      total_processed: self.processed.load(Ordering::Relaxed),
      last_updated: self.loaded_at,
      model_version: MODEL_VERSION.to_string(),
    }
  }
}

fn require_text(text: &str) -> Result<()> {
  if text.trim().is_empty() {
    return Err(AiError::MissingField("text"));
  }
  Ok(())
}

fn top_score(scores: &[LabelScore]) -> Result<&LabelScore> {
  scores
    .iter()
    .fold(None::<&LabelScore>, |best, s| match best {
      Some(b) if b.score >= s.score => Some(b),
      _ => Some(s),
    })
    .ok_or_else(|| AiError::inference("classifier returned no labels"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ai::models::{MockTextClassifier, MockZeroShotClassifier};

  fn emotion_classifier() -> MockTextClassifier {
    let mut classifier = MockTextClassifier::new();
    classifier.expect_classify().returning(|_| {
      Ok(vec![
        LabelScore::new("joy", 0.7),
        LabelScore::new("neutral", 0.2),
        LabelScore::new("sadness", 0.1),
      ])
    });
    classifier.expect_model_id().return_const("test/emotion".to_string());
    classifier
  }

  fn intent_classifier() -> MockZeroShotClassifier {
    let mut classifier = MockZeroShotClassifier::new();
    classifier.expect_classify().returning(|_, labels| {
      assert_eq!(labels.len(), 4);
      Ok(vec![
        LabelScore::new("question", 0.1),
        LabelScore::new("request", 0.6),
        LabelScore::new("statement", 0.2),
        LabelScore::new("command", 0.1),
      ])
    });
    classifier.expect_model_id().return_const("test/nli".to_string());
    classifier
  }

  fn processor() -> NlpProcessor {
    let labels = crate::ai::labels::DEFAULT_INTENT_LABELS.iter().map(|l| l.to_string()).collect();
    NlpProcessor::new(Box::new(emotion_classifier()), Box::new(intent_classifier()), labels)
  }

  #[test]
  fn test_analyze_emotion_picks_top_label() {
    let analysis = processor().analyze_emotion("What a lovely day").unwrap();
    assert_eq!(analysis.emotion, "joy");
    assert!((analysis.confidence - 0.7).abs() < 1e-6);
    assert_eq!(analysis.all_emotions.len(), 3);
  }

  #[test]
  fn test_process_text_returns_top_intent_and_echoes_input() {
    let analysis = processor().process_text("  please book a table  ", None).unwrap();
    assert_eq!(analysis.intent, "request");
    assert_eq!(analysis.text, "  please book a table  ");
  }

  #[test]
  fn test_generate_response_uses_placeholder() {
    let nlp = processor();
    let context = vec![serde_json::json!({ "role": "user", "text": "hi" })];
    let data = nlp.generate_response("Can you help me?", Some(context.as_slice())).unwrap();

    assert_eq!(data.generated_response.text, "I understand your message.");
    assert_eq!(data.generated_response.confidence, 0.85);
    assert_eq!(data.emotion_analysis.emotion, "joy");
    assert_eq!(data.intent_analysis.intent, "request");
    assert_eq!(nlp.model_stats().total_processed, 2);
  }

  #[test]
  fn test_blank_text_rejected() {
    let err = processor().process_text("   ", None).unwrap_err();
    assert_eq!(err.to_string(), "Missing required field: text");
  }

  #[test]
  fn test_empty_scores_are_an_error() {
    let mut empty = MockTextClassifier::new();
    empty.expect_classify().returning(|_| Ok(Vec::new()));
    let nlp = NlpProcessor::new(Box::new(empty), Box::new(intent_classifier()), vec!["x".into()]);

    assert!(matches!(nlp.analyze_emotion("hello"), Err(AiError::Inference(_))));
  }

  #[test]
  fn test_update_learning_always_accepts() {
    assert!(processor().update_learning(&serde_json::json!({ "rating": 5 })));
  }

  #[test]
  fn test_model_info() {
    let info = processor().model_info();
    assert!(info.models_loaded);
    assert_eq!(info.emotion_model.as_deref(), Some("test/emotion"));
    assert_eq!(info.intent_model.as_deref(), Some("test/nli"));

    let unloaded = NlpProcessor::unloaded_info(&["a".to_string()]);
    assert!(!unloaded.models_loaded);
    assert_eq!(unloaded.candidate_labels, vec!["a"]);
  }
}
