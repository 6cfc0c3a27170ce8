//! Numeric post-processing shared by the vision and text models

use std::cmp::Ordering;

/// Axis-aligned candidate box in corner form with its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredBox {
  pub x1: f32,
  pub y1: f32,
  pub x2: f32,
  pub y2: f32,
  pub score: f32,
}

impl ScoredBox {
  pub fn width(&self) -> f32 {
    (self.x2 - self.x1).max(0.0)
  }

  pub fn height(&self) -> f32 {
    (self.y2 - self.y1).max(0.0)
  }

  pub fn area(&self) -> f32 {
    self.width() * self.height()
  }
}

/// Intersection over union of two boxes, 0 when either is degenerate
pub fn iou(a: &ScoredBox, b: &ScoredBox) -> f32 {
  let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
  let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
  let intersection = ix * iy;
  let union = a.area() + b.area() - intersection;

  if union <= f32::EPSILON {
    return 0.0;
  }
  intersection / union
}

/// Greedy hard NMS: keep the best box, drop everything overlapping it above the threshold, repeat
pub fn non_max_suppression(mut candidates: Vec<ScoredBox>, iou_threshold: f32) -> Vec<ScoredBox> {
  candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

  let mut kept: Vec<ScoredBox> = Vec::new();
  for candidate in candidates {
    if kept.iter().all(|k| iou(k, &candidate) <= iou_threshold) {
      kept.push(candidate);
    }
  }
  kept
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
  if logits.is_empty() {
    return Vec::new();
  }

  let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
  let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
  let sum: f32 = exps.iter().sum();
  exps.into_iter().map(|e| e / sum).collect()
}

/// Pass through outputs that already form a distribution, softmax anything else
pub fn to_probabilities(outputs: &[f32]) -> Vec<f32> {
  let in_range = outputs.iter().all(|p| (0.0..=1.0).contains(p));
  let sum: f32 = outputs.iter().sum();

  if in_range && (sum - 1.0).abs() < 1e-3 {
    outputs.to_vec()
  } else {
    softmax(outputs)
  }
}

/// Index of the largest value; ties go to the first occurrence
pub fn argmax(values: &[f32]) -> Option<usize> {
  let mut best: Option<(usize, f32)> = None;
  for (i, &v) in values.iter().enumerate() {
    match best {
      Some((_, b)) if v <= b => {}
      _ => best = Some((i, v)),
    }
  }
  best.map(|(i, _)| i)
}
