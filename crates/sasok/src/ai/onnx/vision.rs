use anyhow::{anyhow, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;
use ort::{session::Session, value::Value};
use std::collections::HashMap;

use super::{input_names, load_session, output_names, TensorData};
use crate::ai::models::{EmotionClassifier, FaceBox, FaceDetector};
use crate::ai::postprocess::{non_max_suppression, ScoredBox};
use crate::config::{TensorLayout, VisionConfig};
use crate::error::AiError;

/// Thresholds applied to raw detector output
#[derive(Debug, Clone, Copy)]
pub(crate) struct DetectionParams {
  pub confidence_threshold: f32,
  pub iou_threshold: f32,
  pub min_face_size: u32,
}

/// UltraFace-style detector: `scores` `[1, N, 2]` and `boxes` `[1, N, 4]` with
/// corner coordinates normalised to the input frame
pub struct OnnxFaceDetector {
  session: Session,
  input_name: String,
  scores_name: String,
  boxes_name: String,
  input_width: u32,
  input_height: u32,
  params: DetectionParams,
}

#[cfg(not(tarpaulin_include))]
impl OnnxFaceDetector {
  pub fn load(config: &VisionConfig) -> Result<Self> {
    let session = load_session(&config.face_detector_model)?;

    let input_name = input_names(&session)
      .into_iter()
      .next()
      .ok_or_else(|| anyhow!("face detector declares no inputs"))?;
    let (scores_name, boxes_name) = resolve_detector_outputs(&output_names(&session))?;

    Ok(Self {
      session,
      input_name,
      scores_name,
      boxes_name,
      input_width: config.detector_input_width,
      input_height: config.detector_input_height,
      params: DetectionParams {
        confidence_threshold: config.confidence_threshold,
        iou_threshold: config.iou_threshold,
        min_face_size: config.min_face_size,
      },
    })
  }

  fn run(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>> {
    let tensor: Value =
      Value::from_array(detector_input(image, self.input_width, self.input_height))?.into();
    let inputs = HashMap::from([(self.input_name.clone(), tensor)]);

    let outputs = self.session.run(inputs)?;
    let (_, scores) = outputs
      .get(self.scores_name.as_str())
      .ok_or_else(|| anyhow!("missing detector output '{}'", self.scores_name))?
      .extract_f32_data()?;
    let (_, boxes) = outputs
      .get(self.boxes_name.as_str())
      .ok_or_else(|| anyhow!("missing detector output '{}'", self.boxes_name))?
      .extract_f32_data()?;

    decode_detections(scores, boxes, image.width(), image.height(), self.params)
  }
}

impl FaceDetector for OnnxFaceDetector {
  fn detect(&mut self, image: &RgbImage) -> crate::error::Result<Vec<FaceBox>> {
    self.run(image).map_err(|e| AiError::inference(format!("{e:#}")))
  }
}

/// Pick the score and box outputs by name, falling back to declaration order
fn resolve_detector_outputs(names: &[String]) -> Result<(String, String)> {
  let find = |needle: &str| names.iter().find(|name| name.to_lowercase().contains(needle)).cloned();

  match (find("score"), find("box")) {
    (Some(scores), Some(boxes)) => Ok((scores, boxes)),
    _ if names.len() >= 2 => Ok((names[0].clone(), names[1].clone())),
    _ => Err(anyhow!("face detector must expose scores and boxes outputs, found {names:?}")),
  }
}

/// Resize to the detector frame and normalise to `(p - 127) / 128` in NCHW order
pub(crate) fn detector_input(image: &RgbImage, width: u32, height: u32) -> Array4<f32> {
  let resized = image::imageops::resize(image, width, height, FilterType::Triangle);

  Array4::from_shape_fn((1, 3, height as usize, width as usize), |(_, c, y, x)| {
    let pixel = resized.get_pixel(x as u32, y as u32);
    (pixel[c] as f32 - 127.0) / 128.0
  })
}

/// Turn flat detector output into face boxes in source image pixels
pub(crate) fn decode_detections(
  scores: &[f32],
  boxes: &[f32],
  image_width: u32,
  image_height: u32,
  params: DetectionParams,
) -> Result<Vec<FaceBox>> {
  let anchors = scores.len() / 2;
  if boxes.len() != anchors * 4 {
    return Err(anyhow!(
      "detector output mismatch: {} scores for {} box values",
      scores.len(),
      boxes.len()
    ));
  }

  let (w, h) = (image_width as f32, image_height as f32);
  let candidates = (0..anchors)
    .filter(|&i| scores[i * 2 + 1] >= params.confidence_threshold)
    .map(|i| {
      let corners = &boxes[i * 4..i * 4 + 4];
      ScoredBox {
        x1: (corners[0] * w).clamp(0.0, w),
        y1: (corners[1] * h).clamp(0.0, h),
        x2: (corners[2] * w).clamp(0.0, w),
        y2: (corners[3] * h).clamp(0.0, h),
        score: scores[i * 2 + 1],
      }
    })
    .filter(|b| {
      let min = params.min_face_size as f32;
      b.width().round() >= min && b.height().round() >= min
    })
    .collect();

  let faces = non_max_suppression(candidates, params.iou_threshold)
    .into_iter()
    .map(|b| {
      FaceBox::new(
        b.x1.round() as u32,
        b.y1.round() as u32,
        b.width().round() as u32,
        b.height().round() as u32,
      )
    })
    .collect();

  Ok(faces)
}

/// Seven-way facial expression classifier over a square grayscale crop
pub struct OnnxEmotionClassifier {
  session: Session,
  input_name: String,
  output_name: String,
  side: u32,
  layout: TensorLayout,
}

#[cfg(not(tarpaulin_include))]
impl OnnxEmotionClassifier {
  pub fn load(config: &VisionConfig) -> Result<Self> {
    let session = load_session(&config.emotion_model)?;

    let input_name = input_names(&session)
      .into_iter()
      .next()
      .ok_or_else(|| anyhow!("emotion model declares no inputs"))?;
    let output_name = output_names(&session)
      .into_iter()
      .next()
      .ok_or_else(|| anyhow!("emotion model declares no outputs"))?;

    Ok(Self {
      session,
      input_name,
      output_name,
      side: config.classifier_input_size,
      layout: config.classifier_layout,
    })
  }

  fn run(&mut self, pixels: &[f32]) -> Result<Vec<f32>> {
    let tensor: Value = Value::from_array(classifier_input(pixels, self.side, self.layout)?)?.into();
    let inputs = HashMap::from([(self.input_name.clone(), tensor)]);

    let outputs = self.session.run(inputs)?;
    let (_, scores) = outputs
      .get(self.output_name.as_str())
      .ok_or_else(|| anyhow!("missing classifier output '{}'", self.output_name))?
      .extract_f32_data()?;

    Ok(scores.to_vec())
  }
}

impl EmotionClassifier for OnnxEmotionClassifier {
  fn predict(&mut self, pixels: &[f32]) -> crate::error::Result<Vec<f32>> {
    self.run(pixels).map_err(|e| AiError::inference(format!("{e:#}")))
  }

  fn input_side(&self) -> u32 {
    self.side
  }

  fn input_shape(&self) -> Vec<usize> {
    layout_shape(self.side, self.layout).to_vec()
  }
}

fn layout_shape(side: u32, layout: TensorLayout) -> [usize; 4] {
  let side = side as usize;
  match layout {
    TensorLayout::Nhwc => [1, side, side, 1],
    TensorLayout::Nchw => [1, 1, side, side],
  }
}

/// A single channel has the same memory order in both layouts, only the shape differs
pub(crate) fn classifier_input(pixels: &[f32], side: u32, layout: TensorLayout) -> Result<Array4<f32>> {
  let [n, a, b, c] = layout_shape(side, layout);
  Ok(Array4::from_shape_vec((n, a, b, c), pixels.to_vec())?)
}
