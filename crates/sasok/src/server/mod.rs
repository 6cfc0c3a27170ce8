//! REST API for the SASOK backend
//!
//! Placeholder routes kept for the frontend plus the analysis pipeline
//! endpoints. Uses axum for routing and schemars-annotated request types.

pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod startup;
pub mod state;
pub mod types;

pub use routing::create_router;
pub use state::AppState;
