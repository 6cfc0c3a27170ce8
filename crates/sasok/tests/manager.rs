mod common;

use serde_json::json;
use tempfile::TempDir;

use common::{manager, png_base64, FakeModels};
use sasok::ai::emotion_detector::FaceResult;
use sasok::ai::labels::FaceEmotion;
use sasok::ai::manager::{AiInput, AnalysisResult};
use sasok::ai::models::FaceBox;

#[tokio::test]
async fn test_failed_model_load_is_retried() {
  let dir = TempDir::new().unwrap();
  let models = FakeModels { failing_loads: 1, ..FakeModels::with_faces(vec![FaceBox::new(0, 0, 32, 32)]) };
  let manager = manager(dir.path(), models.clone());
  let image = png_base64(64, 64);

  let first = manager.process_image(&image).await;
  assert_eq!(first.error_message(), Some("Face detector not available: warming up"));

  let second = manager.process_image(&image).await.into_result().unwrap();
  assert_eq!(second.faces_detected, 1);

  manager.process_image(&image).await;
  assert_eq!(models.detector_loads(), 2);
}

#[tokio::test]
async fn test_video_frame_uses_frame_message() {
  let dir = TempDir::new().unwrap();
  let manager = manager(dir.path(), FakeModels::default());

  let outcome = manager.process_video_frame(&png_base64(32, 32)).await;
  assert_eq!(outcome.error_message(), Some("No faces detected in frame"));

  let outcome = manager.process_video_frame("not base64!").await;
  assert!(outcome.error_message().unwrap().starts_with("Invalid image data"));
}

#[tokio::test]
async fn test_dispatch_returns_face_results() {
  let dir = TempDir::new().unwrap();
  let manager = manager(dir.path(), FakeModels::with_faces(vec![FaceBox::new(4, 4, 24, 24)]));

  let outcome = manager.process_input(&AiInput::new("video_frame", png_base64(40, 40)), None).await;

  let Some(AnalysisResult::Faces(analysis)) = outcome.data else {
    panic!("expected face analysis, got {:?}", outcome.error);
  };
  let FaceResult::Analyzed(face) = &analysis.results[0] else {
    panic!("face analysis failed");
  };
  assert_eq!(face.emotion, FaceEmotion::Happy);
  assert!((face.confidence - 0.6).abs() < 1e-6);
  assert_eq!(face.face_location, FaceBox::new(4, 4, 24, 24));
}

#[tokio::test]
async fn test_interactions_feed_learning_stats() {
  let dir = TempDir::new().unwrap();
  let manager = manager(dir.path(), FakeModels::with_faces(vec![FaceBox::new(0, 0, 30, 30)]));

  manager.process_input(&AiInput::image(png_base64(60, 60)), None).await;
  manager.process_input(&AiInput::text("I love it"), None).await;
  manager.process_input(&AiInput::text("   "), None).await;
  manager.process_input(&AiInput::new("audio", "x"), None).await;
  manager.process_feedback(json!({ "rating": 4 })).await;

  let status = manager.system_status().await.into_result().unwrap();
  let stats = &status.components.learning_system;

  assert_eq!(stats.total_interactions, 3);
  assert_eq!(stats.interactions_by_type.get("image"), Some(&1));
  assert_eq!(stats.interactions_by_type.get("text"), Some(&2));
  assert_eq!(stats.feedback_count, 1);
  assert_eq!(stats.training_samples, 1);
  assert_eq!(stats.emotion_distribution.get("happy"), Some(&1));
  assert_eq!(stats.emotion_distribution.get("joy"), Some(&1));
  assert!(stats.last_interaction.is_some());

  assert!(status.components.emotion_detector.model_loaded);
  assert_eq!(status.components.emotion_detector.input_shape, Some(vec![1, 48, 48, 1]));
  let nlp = &status.components.nlp_processor;
  assert!(nlp.info.models_loaded);
  assert_eq!(nlp.info.intent_model.as_deref(), Some("fake/nli"));
  assert_eq!(nlp.stats.as_ref().unwrap().total_processed, 3);
}

#[tokio::test]
async fn test_blank_text_is_a_missing_field() {
  let dir = TempDir::new().unwrap();
  let manager = manager(dir.path(), FakeModels::default());

  let outcome = manager.process_text("  ", None).await;

  assert_eq!(outcome.error_message(), Some("Missing required field: text"));
}
