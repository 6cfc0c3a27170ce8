//! Interaction and feedback logs kept for future retraining

use chrono::{DateTime, Utc};
use journal::Journal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AiError, Result};

pub const INTERACTIONS_FILE: &str = "interactions.jsonl";
pub const TRAINING_DATA_FILE: &str = "training_data.jsonl";

// Records
// =======

/// One dispatched input and what the pipeline made of it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
  pub id: Uuid,
  pub input_type: String,
  pub input: Value,
  pub result: Value,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
  pub id: Uuid,
  pub data: Value,
  pub timestamp: DateTime<Utc>,
}

/// Lines of the interaction journal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LearningEvent {
  Interaction(InteractionRecord),
  Feedback(FeedbackRecord),
}

/// Journal line as read for statistics; the stored `input` payload is skipped
#[derive(Debug, Deserialize)]
struct EventSummary {
  kind: String,
  #[serde(default)]
  input_type: Option<String>,
  #[serde(default)]
  result: Value,
  timestamp: DateTime<Utc>,
}

/// A sample queued for the next retraining run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSample {
  pub id: Uuid,
  pub source: String,
  pub data: Value,
  pub added_at: DateTime<Utc>,
}

// Results
// =======

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingComponent {
  EmotionDetection,
  NlpProcessing,
}

impl TrainingComponent {
  pub const ALL: [TrainingComponent; 2] =
    [TrainingComponent::EmotionDetection, TrainingComponent::NlpProcessing];

  pub fn as_str(&self) -> &'static str {
    match self {
      TrainingComponent::EmotionDetection => "emotion_detection",
      TrainingComponent::NlpProcessing => "nlp_processing",
    }
  }
}

impl FromStr for TrainingComponent {
  type Err = AiError;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|c| c.as_str() == s)
      .ok_or_else(|| AiError::UnknownComponent(s.to_string()))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedInteraction {
  pub interaction_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
  pub component: TrainingComponent,
  pub samples_available: usize,
  pub updated: bool,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LearningStats {
  pub total_interactions: usize,
  pub interactions_by_type: BTreeMap<String, usize>,
  pub feedback_count: usize,
  pub training_samples: usize,
  pub emotion_distribution: BTreeMap<String, usize>,
  pub last_interaction: Option<DateTime<Utc>>,
}

impl LearningStats {
  fn record_interaction(&mut self, input_type: &str, result: &Value, timestamp: DateTime<Utc>) {
    self.total_interactions += 1;
    *self.interactions_by_type.entry(input_type.to_string()).or_default() += 1;
    for emotion in emotions_in(result) {
      *self.emotion_distribution.entry(emotion).or_default() += 1;
    }
    if self.last_interaction.is_none_or(|last| timestamp > last) {
      self.last_interaction = Some(timestamp);
    }
  }
}

// Learning System
// ===============

pub struct LearningSystem {
  events: Journal,
  training: Journal,
  /// Running totals, seeded from the journals on first use
  stats: Mutex<Option<LearningStats>>,
}

impl LearningSystem {
  /// Open (or create) the journals inside `data_dir`
  pub fn open(data_dir: &Path) -> Result<Self> {
    Ok(Self {
      events: Journal::open(data_dir.join(INTERACTIONS_FILE))?,
      training: Journal::open(data_dir.join(TRAINING_DATA_FILE))?,
      stats: Mutex::new(None),
    })
  }

  pub async fn log_interaction(
    &self,
    input_type: &str,
    input: Value,
    result: Value,
  ) -> Result<LoggedInteraction> {
    let record = InteractionRecord {
      id: Uuid::new_v4(),
      input_type: input_type.to_string(),
      input,
      result,
      timestamp: Utc::now(),
    };
    let interaction_id = record.id;
    let event = LearningEvent::Interaction(record);

    let mut stats = self.stats.lock().await;
    self.events.append(&event).await?;
    if let (Some(stats), LearningEvent::Interaction(record)) = (stats.as_mut(), &event) {
      stats.record_interaction(&record.input_type, &record.result, record.timestamp);
    }
    tracing::debug!("Logged {input_type} interaction {interaction_id}");
    Ok(LoggedInteraction { interaction_id })
  }

  pub async fn log_feedback(&self, data: Value) -> Result<Uuid> {
    let record = FeedbackRecord { id: Uuid::new_v4(), data, timestamp: Utc::now() };
    let id = record.id;

    let mut stats = self.stats.lock().await;
    self.events.append(&LearningEvent::Feedback(record)).await?;
    if let Some(stats) = stats.as_mut() {
      stats.feedback_count += 1;
    }
    Ok(id)
  }

  /// Queue feedback as a retraining sample
  pub async fn update_training_data(&self, feedback: &Value) -> Result<()> {
    let sample = TrainingSample {
      id: Uuid::new_v4(),
      source: "feedback".to_string(),
      data: feedback.clone(),
      added_at: Utc::now(),
    };

    let mut stats = self.stats.lock().await;
    self.training.append(&sample).await?;
    if let Some(stats) = stats.as_mut() {
      stats.training_samples += 1;
    }
    Ok(())
  }

  /// Report what a retraining run would use; weights are not touched
  pub async fn train_models(&self, component: &str) -> Result<TrainingReport> {
    let component = component.parse::<TrainingComponent>()?;
    let samples_available = self.training.len().await?;

    tracing::info!(
      "Training requested for {}: {samples_available} samples available, model update deferred",
      component.as_str()
    );

    Ok(TrainingReport { component, samples_available, updated: true, timestamp: Utc::now() })
  }

  pub async fn learning_stats(&self) -> Result<LearningStats> {
    let mut cached = self.stats.lock().await;
    if let Some(stats) = cached.as_ref() {
      return Ok(stats.clone());
    }

    let stats = self.scan_stats().await?;
    *cached = Some(stats.clone());
    Ok(stats)
  }

  /// Full pass over both journals; callers hold the stats lock
  async fn scan_stats(&self) -> Result<LearningStats> {
    let events: Vec<EventSummary> = self.events.read_all().await?;
    let mut stats = LearningStats { training_samples: self.training.len().await?, ..Default::default() };

    for event in events {
      match (event.kind.as_str(), event.input_type) {
        ("interaction", Some(input_type)) => {
          stats.record_interaction(&input_type, &event.result, event.timestamp)
        }
        ("feedback", _) => stats.feedback_count += 1,
        _ => {}
      }
    }

    Ok(stats)
  }

  pub async fn interactions(&self, limit: usize) -> Result<Vec<InteractionRecord>> {
    let events: Vec<LearningEvent> = self.events.read_all().await?;
    let mut records: Vec<InteractionRecord> = events
      .into_iter()
      .filter_map(|event| match event {
        LearningEvent::Interaction(record) => Some(record),
        LearningEvent::Feedback(_) => None,
      })
      .collect();

    if records.len() > limit {
      records.drain(..records.len() - limit);
    }
    Ok(records)
  }
}

/// Emotion labels found in a logged result (face results and text analysis)
fn emotions_in(result: &Value) -> Vec<String> {
  let mut emotions = Vec::new();

  if let Some(faces) = result.get("results").and_then(Value::as_array) {
    emotions.extend(faces.iter().filter_map(|f| f.get("emotion")?.as_str().map(str::to_string)));
  }

  if let Some(emotion) = result.pointer("/response/emotion_analysis/emotion").and_then(Value::as_str) {
    emotions.push(emotion.to_string());
  }

  emotions
}
