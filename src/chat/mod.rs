//! Chat building blocks
//!
//! Messages, bounded history, file-backed persistence, prompt templates
//! and the interactive session loop.

pub mod history;
pub mod message;
pub mod prompt;
pub mod session;
pub mod store;

pub use history::{ChatHistory, MAX_HISTORY_MESSAGES};
pub use message::{flatten, ChatMessage, Role};
pub use prompt::{Chain, PromptTemplate};
pub use session::ChatSession;
pub use store::HistoryStore;
