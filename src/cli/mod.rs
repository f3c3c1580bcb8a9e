//! CLI module for quizfolio
//!
//! Handles command-line argument parsing and configuration management.

pub mod args;
pub mod config;

pub use args::{parse_vars, Args, Commands, Verbosity};
pub use config::{Config, Secrets};
