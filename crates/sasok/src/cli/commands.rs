use anyhow::{anyhow, Context, Result};
use colored::*;
use serde_json::Value;
use std::path::Path;

use crate::ai::imaging::{draw_results, encode_base64};
use crate::ai::Outcome;
use crate::cli::client::SasokClient;
use crate::cli::display::{
  print_face_analysis, print_failure, print_log_entry, print_status, print_text_analysis,
  print_training,
};

/// Print the payload of a successful outcome, or its error
fn show<T>(outcome: &Outcome<T>, print: impl FnOnce(&T)) {
  match (&outcome.data, outcome.is_success()) {
    (Some(data), true) => print(data),
    _ => print_failure(outcome.error_message()),
  }
}

pub async fn health(client: &SasokClient) -> Result<()> {
  let response = client.health().await?;
  println!("{} {} is {}", "✓".green(), client.base_url().cyan(), response.status.green().bold());
  Ok(())
}

pub async fn status(client: &SasokClient) -> Result<()> {
  let outcome = client.status().await?;
  show(&outcome, print_status);
  Ok(())
}

pub async fn text(client: &SasokClient, text: &str) -> Result<()> {
  let outcome = client.analyze_text(text).await?;
  show(&outcome, print_text_analysis);
  Ok(())
}

pub async fn image(client: &SasokClient, path: &Path) -> Result<()> {
  let bytes = read_image(path)?;
  let outcome = client.analyze_image(encode_base64(&bytes)).await?;
  show(&outcome, print_face_analysis);
  Ok(())
}

/// Analyse an image on the server and write a copy with face boxes drawn
pub async fn annotate(client: &SasokClient, input: &Path, output: &Path) -> Result<()> {
  let bytes = read_image(input)?;
  let mut picture = image::load_from_memory(&bytes)
    .with_context(|| format!("Failed to decode {}", input.display()))?
    .to_rgb8();

  let outcome = client.analyze_image(encode_base64(&bytes)).await?;
  show(&outcome, print_face_analysis);
  if !outcome.is_success() {
    return Err(anyhow!("Nothing to annotate"));
  }

  draw_results(&mut picture, &outcome);
  picture.save(output).with_context(|| format!("Failed to write {}", output.display()))?;

  println!("\n{} Annotated image written to {}", "✓".green(), output.display().to_string().cyan());
  Ok(())
}

pub async fn feedback(client: &SasokClient, raw: &str) -> Result<()> {
  let feedback: Value = serde_json::from_str(raw).context("Feedback must be valid JSON")?;
  let outcome = client.feedback(&feedback).await?;
  show(&outcome, |ack| println!("{} {} ({})", "✓".green(), ack.message, ack.feedback_id));
  Ok(())
}

pub async fn train(client: &SasokClient) -> Result<()> {
  let outcome = client.train().await?;
  show(&outcome, print_training);
  Ok(())
}

pub async fn logs(client: &SasokClient, limit: usize, level: &str) -> Result<()> {
  let logs = client.logs(limit, level).await?;

  if logs.is_empty() {
    println!("No logs found.");
    return Ok(());
  }

  for log in &logs {
    print_log_entry(log);
  }
  Ok(())
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
  std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
