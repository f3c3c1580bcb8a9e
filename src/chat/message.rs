//! Chat message types
//!
//! The conversation unit exchanged with the model by every front end
//! (single prompts, chat sessions, chains, the agent loop and the proxy).

use serde::{Deserialize, Serialize};

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instructions that frame the conversation
    System,
    /// The user
    Human,
    /// The model
    Ai,
}

impl Role {
    /// Upper-case label used when a conversation is flattened to plain text
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "SYSTEM",
            Role::Human => "USER",
            Role::Ai => "ASSISTANT",
        }
    }

    /// Parse the role names accepted in prompt templates
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Role::System),
            "human" | "user" => Some(Role::Human),
            "ai" | "assistant" | "model" => Some(Role::Ai),
            _ => None,
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(Role::Ai, content)
    }
}

/// Flatten a conversation into `ROLE: content` lines
pub fn flatten(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}
