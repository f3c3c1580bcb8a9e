//! Tool registry
//!
//! Maps tool names to implementations and renders the tool block of the
//! agent's system prompt.
//!
//! Default tools:
//! - search_web: Serper web search
//! - calculate: safe arithmetic
//! - get_weather: wttr.in current weather

use crate::cli::config::ToolsConfig;
use crate::tools::calculator::Calculator;
use crate::tools::search::WebSearch;
use crate::tools::types::{Tool, ToolResult};
use crate::tools::weather::Weather;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Call protocol appended to the tool descriptions
const PROTOCOL: &str = "Use this format when calling a tool:
TOOL: tool_name
INPUT: the input value
REASON: why you're using this tool

When done, provide your final response as:
ANSWER: your final answer to the user";

/// Tool registry
#[derive(Clone, Default)]
pub struct ToolRegistry {
    /// Registration order is the order shown to the model
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the three standard tools
    pub fn with_defaults(config: &ToolsConfig, serper_api_key: Option<String>) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut registry = Self::new();
        registry.register(Arc::new(WebSearch::new(
            &config.search_url,
            serper_api_key,
            timeout,
        )));
        registry.register(Arc::new(Calculator));
        registry.register(Arc::new(Weather::new(&config.weather_url, timeout)));
        registry
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name; unknown names produce a failed result
    pub async fn execute(&self, name: &str, input: &str) -> ToolResult {
        match self.get(name) {
            Some(tool) => tool.run(input).await,
            None => {
                warn!(tool = name, "unknown tool requested");
                ToolResult::failure(
                    name,
                    format!("Error: Tool '{}' not found", name),
                    Duration::ZERO,
                )
            }
        }
    }

    /// Tool descriptions plus the call protocol, for the system prompt
    pub fn describe(&self) -> String {
        let mut out = String::from("You have access to these tools:\n");
        for (i, tool) in self.tools.iter().enumerate() {
            out.push_str(&format!(
                "\n{}. {}\n   - {}\n   - Example: {}\n",
                i + 1,
                tool.signature(),
                tool.description(),
                tool.example()
            ));
        }
        out.push('\n');
        out.push_str(PROTOCOL);
        out
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ToolRegistry {
        ToolRegistry::with_defaults(&ToolsConfig::default(), None)
    }

    #[test]
    fn test_default_tools_registered() {
        let registry = registry();
        assert_eq!(
            registry.tool_names(),
            vec!["search_web", "calculate", "get_weather"]
        );
        assert!(registry.contains("calculate"));
        assert!(!registry.contains("run_command"));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = registry();
        registry.register(Arc::new(Calculator));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.tool_names()[2], "calculate");
    }

    #[test]
    fn test_describe_contains_protocol() {
        let text = registry().describe();
        assert!(text.starts_with("You have access to these tools:"));
        assert!(text.contains("1. search_web(query: string)"));
        assert!(text.contains("2. calculate(expression: string)"));
        assert!(text.contains("Example: get_weather(\"Berlin\")"));
        assert!(text.contains("TOOL: tool_name\nINPUT: the input value"));
        assert!(text.ends_with("ANSWER: your final answer to the user"));
    }

    #[tokio::test]
    async fn test_execute_known_and_unknown() {
        let registry = registry();
        let result = registry.execute("calculate", "sqrt(144)").await;
        assert_eq!(result.observation(), "12");

        let missing = registry.execute("launch_rocket", "now").await;
        assert!(!missing.success);
        assert_eq!(missing.observation(), "Error: Tool 'launch_rocket' not found");
    }
}
