//! SASOK - emotion and intent analysis backend
//!
//! Face emotion detection, text emotion and intent classification, and an
//! interaction log kept for future retraining, served over a REST API.

pub mod ai;
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
