use anyhow::{anyhow, Result};
use hf_hub::api::tokio::Api;
use ndarray::Array2;
use ort::{session::Session, value::Value};
use serde_json::Value as Json;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use tokenizers::{Encoding, Tokenizer, TruncationParams};

use super::{input_names, load_session, output_names, TensorData};
use crate::ai::labels::LabelScore;
use crate::ai::models::{TextClassifier, ZeroShotClassifier};
use crate::ai::postprocess::softmax;
use crate::config::HubModel;
use crate::error::AiError;

const CONFIG_FILE: &str = "config.json";
const MAX_SEQUENCE_LENGTH: usize = 512;
/// MNLI heads order their classes contradiction, neutral, entailment
const DEFAULT_ENTAILMENT_INDEX: usize = 2;

struct HubFiles {
  tokenizer: PathBuf,
  model: PathBuf,
  config: PathBuf,
}

/// Transformer encoder with a classification head, as exported by `optimum`
struct SequenceClassifier {
  session: Session,
  tokenizer: Tokenizer,
  input_names: Vec<String>,
  output_name: String,
  labels: Vec<String>,
  model_id: String,
}

#[cfg(not(tarpaulin_include))]
impl SequenceClassifier {
  async fn load(model: &HubModel) -> Result<Self> {
    tracing::info!("Loading {} from the Hugging Face hub...", model.repo);

    let files = download(model).await?;

    let mut tokenizer =
      Tokenizer::from_file(files.tokenizer).map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
    tokenizer
      .with_truncation(Some(TruncationParams { max_length: MAX_SEQUENCE_LENGTH, ..Default::default() }))
      .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

    let config: Json = serde_json::from_str(&std::fs::read_to_string(&files.config)?)?;
    let labels = parse_id2label(&config)?;

    let session = load_session(&files.model)?;
    let input_names = input_names(&session);
    let output_name = output_names(&session)
      .into_iter()
      .find(|name| name == "logits")
      .or_else(|| output_names(&session).into_iter().next())
      .ok_or_else(|| anyhow!("{} declares no outputs", model.repo))?;

    tracing::info!("{} loaded with {} labels", model.repo, labels.len());

    Ok(Self { session, tokenizer, input_names, output_name, labels, model_id: model.repo.clone() })
  }

  fn logits(&mut self, encoding: &Encoding) -> Result<Vec<f32>> {
    let inputs = prepare(encoding, &self.input_names)?;
    let outputs = self.session.run(inputs)?;

    let (shape, data) = outputs
      .get(self.output_name.as_str())
      .ok_or_else(|| anyhow!("No output found from model"))?
      .extract_f32_data()?;

    let classes = shape.last().copied().unwrap_or_default() as usize;
    if classes != self.labels.len() || data.len() < classes {
      return Err(anyhow!(
        "model produced {} logits for {} labels",
        classes,
        self.labels.len()
      ));
    }

    Ok(data[..classes].to_vec())
  }
}

async fn download(model: &HubModel) -> Result<HubFiles> {
  let api = Api::new().map_err(|e| anyhow!("HF API initialization failed: {}", e))?;
  let repo = api.model(model.repo.clone());

  let tokenizer = repo
    .get(&model.tokenizer_file)
    .await
    .map_err(|e| anyhow!("Failed to download tokenizer: {}", e))?;
  let model_path = repo
    .get(&model.model_file)
    .await
    .map_err(|e| anyhow!("Failed to download ONNX model: {}", e))?;
  let config =
    repo.get(CONFIG_FILE).await.map_err(|e| anyhow!("Failed to download {}: {}", CONFIG_FILE, e))?;

  Ok(HubFiles { tokenizer, model: model_path, config })
}

fn to_tensor(data: &[u32]) -> Result<Value> {
  let values: Vec<i64> = data.iter().map(|&x| x as i64).collect();
  let array = Array2::from_shape_vec((1, values.len()), values)?;
  Ok(Value::from_array(array)?.into())
}

/// Build the inputs the model declares; `token_type_ids` is optional on most exports
fn prepare(encoding: &Encoding, expected: &[String]) -> Result<HashMap<String, Value>> {
  let mut input = HashMap::new();
  input.insert("input_ids".to_string(), to_tensor(encoding.get_ids())?);
  input.insert("attention_mask".to_string(), to_tensor(encoding.get_attention_mask())?);

  if expected.iter().any(|name| name == "token_type_ids") {
    input.insert("token_type_ids".to_string(), to_tensor(encoding.get_type_ids())?);
  }

  Ok(input)
}

/// Labels from a transformers `config.json`, ordered by class index
pub(crate) fn parse_id2label(config: &Json) -> Result<Vec<String>> {
  let map = config
    .get("id2label")
    .and_then(Json::as_object)
    .ok_or_else(|| anyhow!("config.json has no id2label map"))?;

  let mut indexed = map
    .iter()
    .map(|(id, label)| -> Result<(usize, String)> {
      let index: usize = id.parse().map_err(|_| anyhow!("invalid label index '{}'", id))?;
      let label = label.as_str().ok_or_else(|| anyhow!("label {} is not a string", id))?;
      Ok((index, label.to_lowercase()))
    })
    .collect::<Result<Vec<_>>>()?;
  indexed.sort_by_key(|(index, _)| *index);

  if indexed.iter().enumerate().any(|(expected, (index, _))| expected != *index) {
    return Err(anyhow!("id2label indices are not contiguous"));
  }

  Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

pub(crate) fn entailment_index(labels: &[String]) -> usize {
  labels.iter().position(|label| label.starts_with("entail")).unwrap_or(DEFAULT_ENTAILMENT_INDEX)
}

/// Pair labels with scores, highest first
pub(crate) fn ranked(labels: &[String], scores: &[f32]) -> Vec<LabelScore> {
  let mut ranked: Vec<LabelScore> =
    labels.iter().zip(scores).map(|(label, &score)| LabelScore::new(label.clone(), score)).collect();
  ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
  ranked
}

fn inference_error(e: anyhow::Error) -> AiError {
  AiError::inference(format!("{e:#}"))
}

/// Single-label text classifier, softmax over the model's own labels
pub struct OnnxTextClassifier {
  inner: SequenceClassifier,
}

#[cfg(not(tarpaulin_include))]
impl OnnxTextClassifier {
  pub async fn load(model: &HubModel) -> Result<Self> {
    Ok(Self { inner: SequenceClassifier::load(model).await? })
  }

  fn run(&mut self, text: &str) -> Result<Vec<LabelScore>> {
    let encoding =
      self.inner.tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let logits = self.inner.logits(&encoding)?;
    Ok(ranked(&self.inner.labels, &softmax(&logits)))
  }
}

impl TextClassifier for OnnxTextClassifier {
  fn classify(&mut self, text: &str) -> crate::error::Result<Vec<LabelScore>> {
    self.run(text).map_err(inference_error)
  }

  fn model_id(&self) -> String {
    self.inner.model_id.clone()
  }
}

/// NLI-based zero-shot classifier
///
/// Each candidate becomes the hypothesis `template` with `{}` replaced by the
/// label; the entailment logits are softmaxed across candidates.
pub struct OnnxZeroShotClassifier {
  inner: SequenceClassifier,
  template: String,
  entailment: usize,
}

#[cfg(not(tarpaulin_include))]
impl OnnxZeroShotClassifier {
  pub async fn load(model: &HubModel, template: &str) -> Result<Self> {
    let inner = SequenceClassifier::load(model).await?;
    let entailment = entailment_index(&inner.labels);
    Ok(Self { inner, template: template.to_string(), entailment })
  }

  fn run(&mut self, text: &str, candidate_labels: &[String]) -> Result<Vec<LabelScore>> {
    let mut entailment_logits = Vec::with_capacity(candidate_labels.len());

    for label in candidate_labels {
      let hypothesis = self.template.replace("{}", label);
      let encoding = self
        .inner
        .tokenizer
        .encode((text, hypothesis.as_str()), true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
      let logits = self.inner.logits(&encoding)?;
      let logit = logits
        .get(self.entailment)
        .copied()
        .ok_or_else(|| anyhow!("no entailment logit at index {}", self.entailment))?;
      entailment_logits.push(logit);
    }

    Ok(ranked(candidate_labels, &softmax(&entailment_logits)))
  }
}

impl ZeroShotClassifier for OnnxZeroShotClassifier {
  fn classify(
    &mut self,
    text: &str,
    candidate_labels: &[String],
  ) -> crate::error::Result<Vec<LabelScore>> {
    self.run(text, candidate_labels).map_err(inference_error)
  }

  fn model_id(&self) -> String {
    self.inner.model_id.clone()
  }
}
