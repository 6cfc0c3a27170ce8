//! Display formatting utilities for CLI output

use colored::*;
use journal::{Level, LogEntry};

use crate::ai::emotion_detector::{FaceAnalysis, FaceResult};
use crate::ai::learning::LearningStats;
use crate::ai::manager::{SystemStatus, TextAnalysis, TrainingSummary};

const BAR_WIDTH: usize = 20;

/// Fixed-width bar for a probability in `[0, 1]`
pub fn confidence_bar(score: f32) -> String {
  let filled = (score.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize;
  format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

pub fn percent(score: f32) -> String {
  format!("{:5.1}%", score * 100.0)
}

pub fn print_failure(error: Option<&str>) {
  println!("{} {}", "✗".red(), error.unwrap_or("unknown error").red());
}

pub fn print_face_analysis(analysis: &FaceAnalysis) {
  println!("{} {} face(s) detected", "✓".green(), analysis.faces_detected.to_string().bold());

  for (index, result) in analysis.results.iter().enumerate() {
    match result {
      FaceResult::Analyzed(face) => {
        let loc = face.face_location;
        println!(
          "\n{} {} at ({}, {}) {}x{}",
          "Face".blue().bold(),
          index + 1,
          loc.x,
          loc.y,
          loc.width,
          loc.height
        );
        println!("  {} {}", face.emotion.to_string().yellow().bold(), percent(face.confidence));

        let mut scores: Vec<_> = face.all_emotions.iter().collect();
        scores.sort_by(|a, b| b.1.total_cmp(a.1));
        for (emotion, score) in scores {
          println!("  {:<9} {} {}", emotion.to_string(), confidence_bar(*score).cyan(), percent(*score));
        }
      }
      FaceResult::Failed { error } => {
        println!("\n{} {} {}", "Face".blue().bold(), index + 1, error.red());
      }
    }
  }
}

pub fn print_text_analysis(analysis: &TextAnalysis) {
  let intent = &analysis.nlp_analysis;
  let emotion = &analysis.response.emotion_analysis;

  println!("{} {}", "Intent:".blue().bold(), intent.intent.yellow().bold());
  println!("  {} {}", confidence_bar(intent.confidence).cyan(), percent(intent.confidence));

  println!("{} {}", "Emotion:".blue().bold(), emotion.emotion.yellow().bold());
  for score in &emotion.all_emotions {
    println!("  {:<9} {} {}", score.label, confidence_bar(score.score).cyan(), percent(score.score));
  }

  println!("{} {}", "Response:".blue().bold(), analysis.response.generated_response.text);
}

pub fn print_status(status: &SystemStatus) {
  let detector = &status.components.emotion_detector;
  let nlp = &status.components.nlp_processor;

  println!("{} {}", "Status:".blue().bold(), status.status.green().bold());
  println!("{} {}", "Updated:".blue().bold(), status.last_updated.to_rfc3339().dimmed());

  println!("\n{}", "Emotion detector".bold());
  println!("  loaded:   {}", loaded(detector.model_loaded));
  println!("  emotions: {}", detector.emotions_supported.join(", "));
  if let Some(shape) = &detector.input_shape {
    println!("  input:    {shape:?}");
  }

  println!("\n{}", "NLP processor".bold());
  println!("  loaded:   {}", loaded(nlp.info.models_loaded));
  if let Some(model) = &nlp.info.emotion_model {
    println!("  emotion:  {}", model.cyan());
  }
  if let Some(model) = &nlp.info.intent_model {
    println!("  intent:   {}", model.cyan());
  }
  println!("  labels:   {}", nlp.info.candidate_labels.join(", "));
  if let Some(stats) = &nlp.stats {
    println!("  processed: {}", stats.total_processed);
  }

  print_learning_stats(&status.components.learning_system);
}

fn print_learning_stats(stats: &LearningStats) {
  println!("\n{}", "Learning system".bold());
  println!("  interactions:     {}", stats.total_interactions);
  for (kind, count) in &stats.interactions_by_type {
    println!("    {kind:<12} {count}");
  }
  println!("  feedback:         {}", stats.feedback_count);
  println!("  training samples: {}", stats.training_samples);
  if !stats.emotion_distribution.is_empty() {
    println!("  emotions seen:");
    for (emotion, count) in &stats.emotion_distribution {
      println!("    {emotion:<12} {count}");
    }
  }
  if let Some(last) = stats.last_interaction {
    println!("  last interaction: {}", last.to_rfc3339().dimmed());
  }
}

pub fn print_training(summary: &TrainingSummary) {
  for (component, report) in &summary.results {
    println!(
      "{} {} ({} samples available)",
      "✓".green(),
      component.as_str().cyan(),
      report.samples_available
    );
  }
}

fn loaded(flag: bool) -> ColoredString {
  if flag {
    "yes".green()
  } else {
    "not yet".yellow()
  }
}

pub fn print_log_entry(log: &LogEntry) {
  let level = log.level.as_str();
  let level_colored = match log.level {
    Level::Error => level.red().bold(),
    Level::Warn => level.yellow().bold(),
    Level::Info => level.blue().bold(),
    Level::Debug => level.green(),
    Level::Success => level.bright_green().bold(),
  };

  println!(
    "{} [{}] {} {}",
    log.timestamp.to_rfc3339().cyan(),
    level_colored,
    log.component.dimmed(),
    log.message
  );

  if let Some(context) = &log.context {
    let mut parts = Vec::new();
    if let Some(request_id) = &context.request_id {
      parts.push(format!("request_id: {}", request_id.bright_blue()));
    }
    if let (Some(method), Some(path)) = (&context.method, &context.path) {
      parts.push(format!("{} {}", method.magenta().bold(), path.cyan()));
    }
    if let Some(status) = context.status_code {
      parts.push(format!("status: {status}"));
    }
    if let Some(duration) = context.duration_ms {
      parts.push(format!("{duration:.2}ms"));
    }
    if !parts.is_empty() {
      println!("    {}", parts.join(", ").dimmed());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_confidence_bar_is_fixed_width() {
    assert_eq!(confidence_bar(0.0).chars().count(), BAR_WIDTH);
    assert_eq!(confidence_bar(1.5).chars().filter(|&c| c == '█').count(), BAR_WIDTH);
    assert_eq!(confidence_bar(0.5).chars().filter(|&c| c == '█').count(), BAR_WIDTH / 2);
  }

  #[test]
  fn test_percent() {
    assert_eq!(percent(0.853), " 85.3%");
  }
}
