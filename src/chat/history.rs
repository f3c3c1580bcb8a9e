//! Bounded chat history
//!
//! Fixed-size FIFO of chat messages. The system prompt is kept outside
//! the buffer so eviction never drops it.

use crate::chat::message::{ChatMessage, Role};
use std::collections::VecDeque;

/// Default maximum number of stored messages
pub const MAX_HISTORY_MESSAGES: usize = 100;

/// Chat history with bounded storage
#[derive(Debug, Clone)]
pub struct ChatHistory {
    system: Option<ChatMessage>,
    messages: VecDeque<ChatMessage>,
    max_messages: usize,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_MESSAGES)
    }

    /// Create history with custom capacity (at least one message)
    pub fn with_capacity(max_messages: usize) -> Self {
        let max_messages = max_messages.max(1);
        Self {
            system: None,
            messages: VecDeque::with_capacity(max_messages.min(MAX_HISTORY_MESSAGES)),
            max_messages,
        }
    }

    /// Pin a system prompt at the front of the conversation
    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.set_system(prompt);
        self
    }

    pub fn set_system(&mut self, prompt: impl Into<String>) {
        self.system = Some(ChatMessage::system(prompt));
    }

    /// Add a message, evicting the oldest when at capacity.
    ///
    /// A system message replaces the pinned prompt instead.
    pub fn push(&mut self, message: ChatMessage) {
        if message.role == Role::System {
            self.system = Some(message);
            return;
        }

        if self.messages.len() >= self.max_messages {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn push_human(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::human(content));
    }

    pub fn push_ai(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::ai(content));
    }

    /// Extend from stored messages, respecting the bound
    pub fn extend<I: IntoIterator<Item = ChatMessage>>(&mut self, messages: I) {
        for message in messages {
            self.push(message);
        }
    }

    /// Full conversation to send to the model, system prompt first
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.system
            .iter()
            .cloned()
            .chain(self.messages.iter().cloned())
            .collect()
    }

    /// Remove and return the newest message
    pub fn pop_last(&mut self) -> Option<ChatMessage> {
        self.messages.pop_back()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.back()
    }

    /// Number of non-system messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_messages
    }

    /// Clear the conversation, keeping the system prompt
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new()
    }
}
