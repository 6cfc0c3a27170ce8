//! Analysis pipeline: models, detectors, the manager and the learning log

pub mod emotion_detector;
pub mod imaging;
pub mod labels;
pub mod learning;
pub mod manager;
pub mod models;
pub mod nlp;
#[cfg(feature = "ml-features")]
pub mod onnx;
pub mod outcome;
pub mod postprocess;
pub mod provider;

pub use emotion_detector::EmotionDetector;
pub use learning::LearningSystem;
pub use manager::AiManager;
pub use nlp::NlpProcessor;
pub use outcome::Outcome;
pub use provider::ModelProvider;
