//! File-backed chat history
//!
//! One JSON document per `(collection, session_id)` at
//! `{root}/{collection}/{session_id}.json`.

use crate::chat::message::ChatMessage;
use crate::errors::{FolioError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Stored chat history document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredHistory {
    pub session_id: String,
    pub collection: String,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

/// Chat history store
#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
    collection: String,
    session_id: String,
}

impl HistoryStore {
    /// Open a store; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>, collection: &str, session_id: &str) -> Result<Self> {
        validate_key("collection", collection)?;
        validate_key("session id", session_id)?;

        Ok(Self {
            root: root.into(),
            collection: collection.to_string(),
            session_id: session_id.to_string(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Path of the history document
    pub fn path(&self) -> PathBuf {
        self.root
            .join(&self.collection)
            .join(format!("{}.json", self.session_id))
    }

    /// Load all stored messages (empty if nothing stored yet)
    pub fn load(&self) -> Result<Vec<ChatMessage>> {
        let path = self.path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&path)?;
        let stored: StoredHistory = serde_json::from_str(&json)?;
        Ok(stored.messages)
    }

    /// Append messages and persist
    pub fn append(&self, messages: &[ChatMessage]) -> Result<()> {
        let mut all = self.load()?;
        all.extend_from_slice(messages);
        self.write(all)
    }

    pub fn add_user_message(&self, content: &str) -> Result<()> {
        self.append(&[ChatMessage::human(content)])
    }

    pub fn add_ai_message(&self, content: &str) -> Result<()> {
        self.append(&[ChatMessage::ai(content)])
    }

    /// Delete the stored history
    pub fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// List session ids stored in this collection
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        let dir = self.root.join(&self.collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    sessions.push(stem.to_string());
                }
            }
        }
        sessions.sort();
        Ok(sessions)
    }

    fn write(&self, messages: Vec<ChatMessage>) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let stored = StoredHistory {
            session_id: self.session_id.clone(),
            collection: self.collection.clone(),
            updated_at: Utc::now(),
            messages,
        };

        // Write-then-rename
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&stored)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn validate_key(what: &str, key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(FolioError::InvalidInput(format!(
            "{} must be non-empty and use only letters, digits, '-' or '_': {:?}",
            what, key
        )))
    }
}
