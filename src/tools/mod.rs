//! Agent tools
//!
//! Three single-input tools (web search, calculator, weather) behind the
//! [`Tool`] trait, collected in a [`ToolRegistry`].

pub mod calculator;
pub mod registry;
pub mod search;
pub mod types;
pub mod weather;

pub use calculator::{calculate, Calculator};
pub use registry::ToolRegistry;
pub use search::WebSearch;
pub use types::{Tool, ToolResult};
pub use weather::Weather;
