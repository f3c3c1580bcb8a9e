//! Model reply parser for the agent protocol
//!
//! The model answers in plain text using line markers:
//!
//! ```text
//! TOOL: calculate
//! INPUT: sqrt(144)
//! REASON: need the root
//! ```
//!
//! or `ANSWER: ...` when done. Anything else is a thought.

use serde::{Deserialize, Serialize};

const ANSWER: &str = "ANSWER:";
const TOOL: &str = "TOOL:";
const INPUT: &str = "INPUT:";
const REASON: &str = "REASON:";

/// Parsed model reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentAction {
    /// Final answer
    Answer { content: String },
    /// Tool invocation
    ToolCall {
        tool: String,
        input: String,
        reason: Option<String>,
    },
    /// Free text with no marker
    Thought { content: String },
}

/// Text between the first marker and the next occurrence of it
fn after_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let rest = &text[text.find(marker)? + marker.len()..];
    Some(match rest.find(marker) {
        Some(end) => &rest[..end],
        None => rest,
    })
}

/// Classify a model reply
pub fn parse_llm_response(response: &str) -> AgentAction {
    let response = response.trim();

    if let Some(answer) = after_marker(response, ANSWER) {
        return AgentAction::Answer {
            content: answer.trim().to_string(),
        };
    }

    if response.contains(TOOL) && response.contains(INPUT) {
        let mut tool = None;
        let mut input = None;
        let mut reason = None;

        for line in response.lines() {
            if line.starts_with(TOOL) {
                tool = after_marker(line, TOOL).map(|s| s.trim().to_string());
            } else if line.starts_with(INPUT) {
                input = after_marker(line, INPUT).map(|s| s.trim().to_string());
            } else if line.starts_with(REASON) {
                reason = after_marker(line, REASON).map(|s| s.trim().to_string());
            }
        }

        if let (Some(tool), Some(input)) = (tool, input) {
            if !tool.is_empty() && !input.is_empty() {
                return AgentAction::ToolCall {
                    tool,
                    input,
                    reason,
                };
            }
        }
    }

    AgentAction::Thought {
        content: response.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_answer() {
        assert_eq!(
            parse_llm_response("I know this.\nANSWER: 1947 "),
            AgentAction::Answer {
                content: "1947".to_string()
            }
        );
    }

    #[test]
    fn test_answer_wins_over_tool() {
        let reply = "TOOL: calculate\nINPUT: 1+1\nANSWER: 2";
        assert!(matches!(parse_llm_response(reply), AgentAction::Answer { .. }));
    }

    #[test]
    fn test_answer_stops_at_repeated_marker() {
        assert_eq!(
            parse_llm_response("ANSWER: first ANSWER: second"),
            AgentAction::Answer {
                content: "first".to_string()
            }
        );
    }

    #[test]
    fn test_tool_call() {
        let reply = "I should compute this.\nTOOL: calculate\nINPUT: sqrt(144)\nREASON: need the root";
        assert_eq!(
            parse_llm_response(reply),
            AgentAction::ToolCall {
                tool: "calculate".to_string(),
                input: "sqrt(144)".to_string(),
                reason: Some("need the root".to_string()),
            }
        );
    }

    #[test]
    fn test_tool_without_reason() {
        let reply = "TOOL: get_weather\nINPUT: Ulm";
        assert_eq!(
            parse_llm_response(reply),
            AgentAction::ToolCall {
                tool: "get_weather".to_string(),
                input: "Ulm".to_string(),
                reason: None,
            }
        );
    }

    #[test]
    fn test_markers_must_start_lines() {
        // Indented INPUT line is not recognised
        let reply = "  TOOL: calculate\n  INPUT: 2+2";
        assert!(matches!(parse_llm_response(reply), AgentAction::Thought { .. }));
    }

    #[test]
    fn test_empty_input_is_thought() {
        let reply = "TOOL: calculate\nINPUT:   ";
        assert!(matches!(parse_llm_response(reply), AgentAction::Thought { .. }));
    }

    #[test]
    fn test_thought() {
        assert_eq!(
            parse_llm_response("  Let me think about it.  "),
            AgentAction::Thought {
                content: "Let me think about it.".to_string()
            }
        );
    }

    #[quickcheck]
    fn prop_text_without_markers_is_thought(text: String) -> bool {
        if text.contains(ANSWER) || text.contains(TOOL) {
            return true;
        }
        matches!(parse_llm_response(&text), AgentAction::Thought { .. })
    }
}
