//! Email Drafter — deterministic email drafting with optional LLM refinement.

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod safety;
