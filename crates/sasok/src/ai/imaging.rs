//! Image decoding, face cropping and result annotation

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops, imageops::FilterType, GrayImage, Luma, Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::ai::emotion_detector::{FaceAnalysis, FaceResult};
use crate::ai::models::FaceBox;
use crate::ai::outcome::Outcome;
use crate::error::{AiError, Result};

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Decode base64 image data, with or without a `data:image/...;base64,` prefix
pub fn decode_image(data: &str) -> Result<RgbImage> {
  let payload = match data.split_once(',') {
    Some((_, rest)) => rest.split(',').next().unwrap_or(rest),
    None => data,
  };
  // Line-wrapped and MIME payloads carry characters outside the alphabet
  let payload: String = payload.chars().filter(|&c| is_base64_symbol(c)).collect();

  if payload.is_empty() {
    return Err(AiError::invalid_image("empty payload"));
  }

  let bytes = STANDARD.decode(&payload).map_err(AiError::invalid_image)?;
  let image = image::load_from_memory(&bytes).map_err(AiError::invalid_image)?;
  Ok(image.to_rgb8())
}

fn is_base64_symbol(c: char) -> bool {
  c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
}

/// Base64-encode raw file bytes for transport
pub fn encode_base64(bytes: &[u8]) -> String {
  STANDARD.encode(bytes)
}

/// Crop a face, convert to grayscale, resize to `side x side` and scale to `[0, 1]`
///
/// The box is clamped to the image; a box entirely outside it is an error.
pub fn crop_face(image: &RgbImage, face: FaceBox, side: u32) -> Result<Vec<f32>> {
  let (img_w, img_h) = image.dimensions();
  if face.x >= img_w || face.y >= img_h {
    return Err(AiError::invalid_image(format!(
      "face box at ({}, {}) lies outside the {img_w}x{img_h} image",
      face.x, face.y
    )));
  }

  let width = face.width.min(img_w - face.x);
  let height = face.height.min(img_h - face.y);
  if width == 0 || height == 0 {
    return Err(AiError::invalid_image("face box has no area"));
  }

  let region = imageops::crop_imm(image, face.x, face.y, width, height).to_image();
  let gray = luma_601(&region);
  let resized = imageops::resize(&gray, side, side, FilterType::Triangle);

  Ok(resized.pixels().map(|p| f32::from(p.0[0]) / 255.0).collect())
}

/// Grayscale with BT.601 luma weights
fn luma_601(image: &RgbImage) -> GrayImage {
  GrayImage::from_fn(image.width(), image.height(), |x, y| {
    let [r, g, b] = image.get_pixel(x, y).0;
    let luma = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    Luma([luma.round().clamp(0.0, 255.0) as u8])
  })
}

/// Draw a box around every successfully analysed face
///
/// Failed analyses and failed per-face entries leave the image untouched.
pub fn draw_results(image: &mut RgbImage, analysis: &Outcome<FaceAnalysis>) {
  let Some(analysis) = analysis.data.as_ref().filter(|_| analysis.success) else {
    return;
  };

  for result in &analysis.results {
    let FaceResult::Analyzed(face) = result else {
      continue;
    };

    let location = face.face_location;
    // Two nested outlines for a 2px border
    for inset in 0..2u32 {
      if location.width <= inset * 2 || location.height <= inset * 2 {
        break;
      }
      let rect = Rect::at((location.x + inset) as i32, (location.y + inset) as i32)
        .of_size(location.width - inset * 2, location.height - inset * 2);
      draw_hollow_rect_mut(image, rect, BOX_COLOR);
    }
  }
}
