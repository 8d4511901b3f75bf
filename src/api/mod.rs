//! HTTP boundary.
//!
//! Request bodies are validated here into [`DraftInput`](crate::pipeline::types::DraftInput)
//! before anything in the pipeline runs; the pipeline itself never sees
//! malformed tone values.

pub mod routes;
pub mod validate;

pub use routes::{AppState, api_routes};
