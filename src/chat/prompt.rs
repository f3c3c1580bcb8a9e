//! Prompt templates and chains
//!
//! A [`PromptTemplate`] is a list of `(role, template)` pairs. Templates use
//! `{name}` placeholders; `{{` and `}}` produce literal braces.
//!
//! A [`Chain`] pipes a formatted template through a model and returns the
//! trimmed reply text.

use crate::chat::message::{ChatMessage, Role};
use crate::errors::{FolioError, Result};
use crate::model::TextModel;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// One piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// Multi-message prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    messages: Vec<(Role, Vec<Segment>)>,
}

impl PromptTemplate {
    /// Build from `(role, template)` pairs; fails on malformed placeholders
    pub fn from_messages<S: AsRef<str>>(messages: &[(Role, S)]) -> Result<Self> {
        let messages = messages
            .iter()
            .map(|(role, template)| Ok((*role, parse_template(template.as_ref())?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { messages })
    }

    /// Single human-message template
    pub fn from_template(template: &str) -> Result<Self> {
        Self::from_messages(&[(Role::Human, template)])
    }

    /// Variable names referenced by the template, sorted
    pub fn input_variables(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .messages
            .iter()
            .flat_map(|(_, segments)| segments.iter())
            .filter_map(|s| match s {
                Segment::Variable(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect();
        names.into_iter().map(String::from).collect()
    }

    /// Substitute variables; a referenced variable missing from `vars` is an error
    pub fn format(&self, vars: &HashMap<String, String>) -> Result<Vec<ChatMessage>> {
        self.messages
            .iter()
            .map(|(role, segments)| {
                let mut content = String::new();
                for segment in segments {
                    match segment {
                        Segment::Literal(text) => content.push_str(text),
                        Segment::Variable(name) => {
                            let value = vars.get(name).ok_or_else(|| {
                                FolioError::TemplateError(format!(
                                    "missing variable '{}'",
                                    name
                                ))
                            })?;
                            content.push_str(value);
                        }
                    }
                }
                Ok(ChatMessage::new(*role, content))
            })
            .collect()
    }
}

fn parse_template(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }

                let name = name.trim();
                if !closed {
                    return Err(FolioError::TemplateError(format!(
                        "unclosed '{{' in template: {}",
                        template
                    )));
                }
                if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    return Err(FolioError::TemplateError(format!(
                        "invalid placeholder '{{{}}}'",
                        name
                    )));
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(name.to_string()));
            }
            '}' => {
                return Err(FolioError::TemplateError(format!(
                    "single '}}' in template: {}",
                    template
                )));
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// template | model | string output
pub struct Chain<M: TextModel> {
    template: PromptTemplate,
    model: M,
}

impl<M: TextModel> Chain<M> {
    pub fn new(template: PromptTemplate, model: M) -> Self {
        Self { template, model }
    }

    /// Format, call the model, return trimmed text
    pub async fn invoke(&self, vars: &HashMap<String, String>) -> Result<String> {
        let messages = self.template.format(vars)?;
        debug!(model = self.model.model_name(), messages = messages.len(), "invoking chain");
        let reply = self.model.generate(&messages).await?;
        Ok(reply.trim().to_string())
    }
}
