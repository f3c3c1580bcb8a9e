//! Interactive chat session
//!
//! Keeps a bounded [`ChatHistory`], optionally mirrors every exchange into a
//! [`HistoryStore`], and drives a rustyline prompt loop until the user types
//! `exit` or hits Ctrl-D.

use crate::chat::history::ChatHistory;
use crate::chat::message::ChatMessage;
use crate::chat::store::HistoryStore;
use crate::errors::{FolioError, Result};
use crate::model::TextModel;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use tracing::{info, warn};

/// Chat session over a model
pub struct ChatSession<M: TextModel> {
    model: M,
    history: ChatHistory,
    store: Option<HistoryStore>,
    stream: bool,
}

impl<M: TextModel> ChatSession<M> {
    pub fn new(model: M, history: ChatHistory) -> Self {
        Self {
            model,
            history,
            store: None,
            stream: false,
        }
    }

    /// Attach persistent storage and load what it already holds
    pub fn with_store(mut self, store: HistoryStore) -> Result<Self> {
        let stored = store.load()?;
        info!(
            session = store.session_id(),
            messages = stored.len(),
            "loaded chat history"
        );
        self.history.extend(stored);
        self.store = Some(store);
        Ok(self)
    }

    /// Print replies as they arrive
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    /// Send one user message and return the reply
    pub async fn send(&mut self, input: &str) -> Result<String> {
        self.send_with(input, &mut |_| {}).await
    }

    async fn send_with(
        &mut self,
        input: &str,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(FolioError::InvalidInput("empty message".to_string()));
        }

        self.history.push_human(input);
        let messages = self.history.to_messages();

        let reply = if self.stream {
            self.model.stream(&messages, on_chunk).await
        } else {
            self.model.generate(&messages).await
        };

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                // Drop the unanswered turn
                self.history.pop_last();
                return Err(e);
            }
        };

        self.history.push_ai(reply.clone());

        if let Some(store) = &self.store {
            if let Err(e) = store.append(&[
                ChatMessage::human(input),
                ChatMessage::ai(reply.as_str()),
            ]) {
                warn!(error = %e, "failed to persist chat history");
            }
        }

        Ok(reply)
    }

    /// Run the interactive prompt loop
    pub async fn run_interactive(&mut self) -> Result<()> {
        let mut editor =
            DefaultEditor::new().map_err(|e| FolioError::Generic(format!("readline: {}", e)))?;

        println!(
            "{}",
            format!("Chatting with {} (type 'exit' to quit)", self.model.model_name()).dimmed()
        );

        loop {
            let line = match editor.readline(&format!("{} ", "You:".bright_cyan().bold())) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(FolioError::Generic(format!("readline: {}", e))),
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if input.eq_ignore_ascii_case("exit") {
                break;
            }
            let _ = editor.add_history_entry(input);

            print!("{} ", "AI:".bright_green().bold());
            let _ = std::io::stdout().flush();

            let streaming = self.stream;
            let result = self
                .send_with(input, &mut |chunk| {
                    print!("{}", chunk);
                    let _ = std::io::stdout().flush();
                })
                .await;

            match result {
                Ok(reply) => {
                    if streaming {
                        println!();
                    } else {
                        println!("{}", reply);
                    }
                }
                Err(e) => {
                    println!();
                    eprintln!("{} {}", "Error:".red().bold(), e);
                }
            }
        }

        println!("{}", "Goodbye!".dimmed());
        Ok(())
    }
}
