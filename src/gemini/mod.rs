//! Gemini generative-AI client
//!
//! Text generation (blocking and SSE streaming) and embeddings over the
//! public REST API.

pub mod client;
pub(crate) mod types;

pub use client::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL};
