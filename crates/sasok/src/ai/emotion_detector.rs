//! Face emotion detection: find faces, classify each crop, pick the arg-max

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::ai::imaging::{crop_face, decode_image};
use crate::ai::labels::FaceEmotion;
use crate::ai::models::{EmotionClassifier, FaceBox, FaceDetector};
use crate::ai::outcome::Outcome;
use crate::ai::postprocess::{argmax, to_probabilities};
use crate::error::{AiError, Result};

pub const MODEL_VERSION: &str = "1.0.0";

/// Classification of one detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceEmotionResult {
  pub emotion: FaceEmotion,
  pub confidence: f32,
  pub all_emotions: BTreeMap<FaceEmotion, f32>,
  pub face_location: FaceBox,
}

/// Per-face entry; a face that fails analysis does not fail its siblings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FaceResult {
  Analyzed(FaceEmotionResult),
  Failed { error: String },
}

/// Successful analysis payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceAnalysis {
  pub faces_detected: usize,
  pub results: Vec<FaceResult>,
}

/// Model description reported by the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorInfo {
  pub emotions_supported: Vec<String>,
  pub model_loaded: bool,
  pub input_shape: Option<Vec<usize>>,
  pub version: String,
}

impl DetectorInfo {
  /// Info for a detector whose models have not been loaded (yet)
  pub fn unloaded() -> Self {
    Self {
      emotions_supported: FaceEmotion::names(),
      model_loaded: false,
      input_shape: None,
      version: MODEL_VERSION.to_string(),
    }
  }
}

pub struct EmotionDetector {
  detector: Mutex<Box<dyn FaceDetector>>,
  classifier: Mutex<Box<dyn EmotionClassifier>>,
}

impl EmotionDetector {
  pub fn new(detector: Box<dyn FaceDetector>, classifier: Box<dyn EmotionClassifier>) -> Self {
    Self { detector: Mutex::new(detector), classifier: Mutex::new(classifier) }
  }

  /// Analyse a base64 (optionally data-URL) encoded image
  pub fn process_image(&self, image_data: &str) -> Outcome<FaceAnalysis> {
    let result =
      decode_image(image_data).and_then(|image| self.analyze(&image, AiError::NoFacesInImage));
    log_failure("image", &result);
    result.into()
  }

  /// Analyse an already decoded video frame
  pub fn process_video_frame(&self, frame: &RgbImage) -> Outcome<FaceAnalysis> {
    let result = self.analyze(frame, AiError::NoFacesInFrame);
    log_failure("video frame", &result);
    result.into()
  }

  fn analyze(&self, image: &RgbImage, no_faces: AiError) -> Result<FaceAnalysis> {
    let faces = self.detect_faces(image)?;
    if faces.is_empty() {
      return Err(no_faces);
    }

    let results = faces.iter().map(|&face| self.analyze_face(image, face)).collect();
    Ok(FaceAnalysis { faces_detected: faces.len(), results })
  }

  pub fn detect_faces(&self, image: &RgbImage) -> Result<Vec<FaceBox>> {
    let mut detector = self.detector.lock().map_err(|_| AiError::inference("face detector lock poisoned"))?;
    detector.detect(image)
  }

  /// Classify a single face; failures become a `{error}` entry
  pub fn analyze_face(&self, image: &RgbImage, face: FaceBox) -> FaceResult {
    match self.classify_face(image, face) {
      Ok(result) => FaceResult::Analyzed(result),
      Err(e) => {
        tracing::error!("Error analyzing face at {face:?}: {e}");
        FaceResult::Failed { error: e.to_string() }
      }
    }
  }

  fn classify_face(&self, image: &RgbImage, face: FaceBox) -> Result<FaceEmotionResult> {
    let mut classifier =
      self.classifier.lock().map_err(|_| AiError::inference("emotion classifier lock poisoned"))?;

    let pixels = crop_face(image, face, classifier.input_side())?;
    let raw = classifier.predict(&pixels)?;
    drop(classifier);

    if raw.len() != FaceEmotion::ALL.len() {
      return Err(AiError::inference(format!(
        "expected {} emotion scores, model returned {}",
        FaceEmotion::ALL.len(),
        raw.len()
      )));
    }

    let probabilities = to_probabilities(&raw);
    let best = argmax(&probabilities).ok_or_else(|| AiError::inference("empty prediction"))?;

    Ok(FaceEmotionResult {
      emotion: FaceEmotion::ALL[best],
      confidence: probabilities[best],
      all_emotions: FaceEmotion::ALL.into_iter().zip(probabilities).collect(),
      face_location: face,
    })
  }

  pub fn model_info(&self) -> DetectorInfo {
    let input_shape = self.classifier.lock().ok().map(|c| c.input_shape());
    DetectorInfo { model_loaded: true, input_shape, ..DetectorInfo::unloaded() }
  }
}

fn log_failure<T>(source: &str, result: &Result<T>) {
  match result {
    Err(e @ (AiError::NoFacesInImage | AiError::NoFacesInFrame)) => {
      tracing::info!("{source}: {e}")
    }
    Err(e) => tracing::error!("Error processing {source}: {e}"),
    Ok(_) => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ai::imaging::encode_base64;
  use crate::ai::models::{MockEmotionClassifier, MockFaceDetector};
  use image::Rgb;
  use std::io::Cursor;

  fn encoded_image(width: u32, height: u32) -> String {
    let image = RgbImage::from_pixel(width, height, Rgb([90, 90, 90]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image)
      .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
      .unwrap();
    encode_base64(&bytes)
  }

  fn classifier_returning(scores: Vec<f32>) -> MockEmotionClassifier {
    let mut classifier = MockEmotionClassifier::new();
    classifier.expect_input_side().return_const(48u32);
    classifier.expect_input_shape().return_const(vec![1usize, 48, 48, 1]);
    classifier.expect_predict().returning(move |pixels| {
      assert_eq!(pixels.len(), 48 * 48);
      Ok(scores.clone())
    });
    classifier
  }

  fn detector_returning(faces: Vec<FaceBox>) -> MockFaceDetector {
    let mut detector = MockFaceDetector::new();
    detector.expect_detect().returning(move |_| Ok(faces.clone()));
    detector
  }

  #[test]
  fn test_no_faces_in_image() {
    let detector = EmotionDetector::new(
      Box::new(detector_returning(vec![])),
      Box::new(classifier_returning(vec![0.0; 7])),
    );

    let outcome = detector.process_image(&encoded_image(64, 64));
    assert!(!outcome.success);
    assert_eq!(outcome.error_message(), Some("No faces detected in the image"));
  }

  #[test]
  fn test_no_faces_in_frame() {
    let detector = EmotionDetector::new(
      Box::new(detector_returning(vec![])),
      Box::new(classifier_returning(vec![0.0; 7])),
    );

    let frame = RgbImage::new(32, 32);
    let outcome = detector.process_video_frame(&frame);
    assert_eq!(outcome.error_message(), Some("No faces detected in frame"));
  }

  #[test]
  fn test_one_result_per_face_with_argmax_label() {
    let faces = vec![FaceBox::new(0, 0, 30, 30), FaceBox::new(30, 30, 30, 30)];
    let detector = EmotionDetector::new(
      Box::new(detector_returning(faces.clone())),
      Box::new(classifier_returning(vec![0.05, 0.05, 0.05, 0.6, 0.1, 0.1, 0.05])),
    );

    let analysis = detector.process_image(&encoded_image(64, 64)).into_result().unwrap();
    assert_eq!(analysis.faces_detected, 2);
    assert_eq!(analysis.results.len(), 2);

    for (result, face) in analysis.results.iter().zip(&faces) {
      let FaceResult::Analyzed(result) = result else { panic!("face should be analysed") };
      assert_eq!(result.emotion, FaceEmotion::Happy);
      assert!((result.confidence - 0.6).abs() < 1e-6);
      assert!((0.0..=1.0).contains(&result.confidence));
      assert_eq!(result.all_emotions.len(), 7);
      assert_eq!(&result.face_location, face);
    }
  }

  #[test]
  fn test_logits_are_normalised() {
    let detector = EmotionDetector::new(
      Box::new(detector_returning(vec![FaceBox::new(0, 0, 20, 20)])),
      Box::new(classifier_returning(vec![-1.0, 0.0, 4.0, 1.0, 0.5, -2.0, 2.0])),
    );

    let analysis = detector.process_video_frame(&RgbImage::new(40, 40)).into_result().unwrap();
    let FaceResult::Analyzed(result) = &analysis.results[0] else { panic!("face should be analysed") };
    assert_eq!(result.emotion, FaceEmotion::Fear);
    assert!(result.confidence > 0.0 && result.confidence <= 1.0);
    let total: f32 = result.all_emotions.values().sum();
    assert!((total - 1.0).abs() < 1e-5);
  }

  #[test]
  fn test_bad_face_does_not_fail_siblings() {
    let faces = vec![FaceBox::new(0, 0, 20, 20), FaceBox::new(500, 500, 20, 20)];
    let detector = EmotionDetector::new(
      Box::new(detector_returning(faces)),
      Box::new(classifier_returning(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0])),
    );

    let analysis = detector.process_video_frame(&RgbImage::new(40, 40)).into_result().unwrap();
    assert_eq!(analysis.faces_detected, 2);
    assert!(matches!(analysis.results[0], FaceResult::Analyzed(_)));
    assert!(matches!(analysis.results[1], FaceResult::Failed { .. }));
  }

  #[test]
  fn test_wrong_output_width_is_a_face_error() {
    let detector = EmotionDetector::new(
      Box::new(detector_returning(vec![FaceBox::new(0, 0, 20, 20)])),
      Box::new(classifier_returning(vec![0.5, 0.5])),
    );

    let analysis = detector.process_video_frame(&RgbImage::new(40, 40)).into_result().unwrap();
    let FaceResult::Failed { error } = &analysis.results[0] else { panic!("expected failure") };
    assert!(error.contains("expected 7 emotion scores"));
  }

  #[test]
  fn test_invalid_image_data() {
    let detector = EmotionDetector::new(
      Box::new(MockFaceDetector::new()),
      Box::new(MockEmotionClassifier::new()),
    );

    let outcome = detector.process_image("definitely not an image");
    assert!(!outcome.success);
    assert!(outcome.error_message().unwrap().starts_with("Invalid image data"));
  }

  #[test]
  fn test_detector_error_propagates_as_failure() {
    let mut failing = MockFaceDetector::new();
    failing.expect_detect().returning(|_| Err(AiError::inference("session crashed")));
    let detector =
      EmotionDetector::new(Box::new(failing), Box::new(classifier_returning(vec![0.0; 7])));

    let outcome = detector.process_video_frame(&RgbImage::new(10, 10));
    assert_eq!(outcome.error_message(), Some("Inference failed: session crashed"));
  }

  #[test]
  fn test_model_info() {
    let detector = EmotionDetector::new(
      Box::new(detector_returning(vec![])),
      Box::new(classifier_returning(vec![0.0; 7])),
    );

    let info = detector.model_info();
    assert!(info.model_loaded);
    assert_eq!(info.input_shape, Some(vec![1, 48, 48, 1]));
    assert_eq!(info.emotions_supported.len(), 7);
    assert_eq!(info.version, "1.0.0");

    assert!(!DetectorInfo::unloaded().model_loaded);
  }

  #[test]
  fn test_serialized_shape() {
    let result = FaceResult::Analyzed(FaceEmotionResult {
      emotion: FaceEmotion::Sad,
      confidence: 0.5,
      all_emotions: [(FaceEmotion::Sad, 0.5), (FaceEmotion::Neutral, 0.5)].into_iter().collect(),
      face_location: FaceBox::new(1, 2, 3, 4),
    });

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["emotion"], "sad");
    assert_eq!(value["all_emotions"]["neutral"], 0.5);
    assert_eq!(value["face_location"]["width"], 3);

    let failed = serde_json::to_value(FaceResult::Failed { error: "x".to_string() }).unwrap();
    assert_eq!(failed, serde_json::json!({ "error": "x" }));
  }
}
