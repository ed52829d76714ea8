//! Model-backed helpers
//!
//! Thin wrappers over a local model server. Nothing in the learning core
//! depends on these.

pub mod ollama;

pub use ollama::{LeadAnalysis, OllamaClient};
