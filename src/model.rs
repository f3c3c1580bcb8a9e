//! Text generation seam
//!
//! Everything that talks to a generative model goes through [`TextModel`],
//! so the chat, chain, agent, enhancement and proxy code can run against
//! the Gemini client or a scripted stand-in.

use crate::chat::ChatMessage;
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A chat-completion model
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Generate a reply for the conversation
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Model identifier for logs
    fn model_name(&self) -> &str;

    /// Convenience wrapper for a single user prompt
    async fn invoke(&self, prompt: &str) -> Result<String> {
        self.generate(&[ChatMessage::human(prompt)]).await
    }

    /// Generate with incremental output. Models without streaming deliver
    /// the whole reply as one chunk.
    async fn stream(
        &self,
        messages: &[ChatMessage],
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        let reply = self.generate(messages).await?;
        on_chunk(&reply);
        Ok(reply)
    }
}

#[async_trait]
impl<T: TextModel + ?Sized> TextModel for Arc<T> {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        (**self).generate(messages).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        (**self).stream(messages, on_chunk).await
    }
}
