//! quizfolio - investment quiz to portfolio report
//!
//! Parses free-text quiz answers into an investor profile, maps it to one of
//! three model portfolios, pulls holdings and performance from the portfolio
//! data API and renders an HTML (optionally PDF) report. The same Gemini
//! client backs a small chat/chain/agent toolkit, document retrieval over
//! qdrant and an HTTP generation proxy.
//!
//! # Architecture
//!
//! - **quiz / portfolio / render / pipeline**: the report run
//! - **gemini / model / chat / agent / tools**: generative-AI tooling
//! - **retrieval / server**: embeddings, vector search, HTTP proxy
//! - **cli / telemetry / display / errors / retry**: ambient plumbing

pub mod errors;
pub mod retry;

pub use errors::{FolioError, Result};

// Report generation
pub mod quiz;
pub mod portfolio;
pub mod render;
pub mod pipeline;

// Generative AI
pub mod model;
pub mod gemini;
pub mod chat;
pub mod agent;
pub mod tools;

pub mod retrieval;
pub mod server;

// Interface
pub mod cli;
pub mod display;
pub mod telemetry;
