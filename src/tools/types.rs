//! Tool execution types
//!
//! Tools never fail the agent loop: every outcome, including backend
//! errors, is a [`ToolResult`] whose observation text goes back to the model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool name that was executed
    pub tool: String,

    /// Result text
    pub output: String,

    /// Whether execution was successful
    pub success: bool,

    /// Execution duration in milliseconds
    pub duration_ms: u64,

    /// Error text if failed
    pub error: Option<String>,
}

impl ToolResult {
    /// Create successful result
    pub fn success(tool: &str, output: String, duration: Duration) -> Self {
        Self {
            tool: tool.to_string(),
            output,
            success: true,
            duration_ms: duration.as_millis() as u64,
            error: None,
        }
    }

    /// Create failed result
    pub fn failure(tool: &str, error: String, duration: Duration) -> Self {
        Self {
            tool: tool.to_string(),
            output: String::new(),
            success: false,
            duration_ms: duration.as_millis() as u64,
            error: Some(error),
        }
    }

    /// Text fed back to the model
    pub fn observation(&self) -> &str {
        match &self.error {
            Some(error) if !self.success => error,
            _ => &self.output,
        }
    }
}

/// A tool the agent can call with a single string input
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name used in `TOOL:` lines
    fn name(&self) -> &str;

    /// Signature line, e.g. `calculate(expression: string)`
    fn signature(&self) -> String;

    /// Description lines for the prompt
    fn description(&self) -> &str;

    /// Usage example, e.g. `calculate("sqrt(144) + 5")`
    fn example(&self) -> &str;

    async fn run(&self, input: &str) -> ToolResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_prefers_error_on_failure() {
        let ok = ToolResult::success("calculate", "12".into(), Duration::from_millis(3));
        assert_eq!(ok.observation(), "12");
        assert_eq!(ok.duration_ms, 3);

        let failed = ToolResult::failure(
            "get_weather",
            "Weather API error: 404".into(),
            Duration::ZERO,
        );
        assert!(!failed.success);
        assert_eq!(failed.observation(), "Weather API error: 404");
    }
}
