//! Tool-using agent loop
//!
//! Each iteration flattens the conversation into `ROLE: content` lines,
//! asks the model for the next action and either returns the answer,
//! runs a tool and feeds its result back, or nudges the model on.

use crate::agent::parser::{parse_llm_response, AgentAction};
use crate::chat::{flatten, ChatMessage};
use crate::errors::Result;
use crate::model::TextModel;
use crate::tools::ToolRegistry;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Default iteration budget
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Reply when the budget runs out
pub const ITERATION_LIMIT_MESSAGE: &str =
    "I couldn't complete the task within the iteration limit.";

const CONTINUE_PROMPT: &str = "Continue. What's your next action?";

/// Observable progress of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentStep {
    /// Raw model reply for an iteration (1-based)
    Reply { iteration: usize, text: String },
    /// Tool about to run
    ToolCall {
        tool: String,
        input: String,
        reason: Option<String>,
    },
    /// Tool output fed back to the model
    ToolResult {
        tool: String,
        output: String,
        success: bool,
    },
    /// Final answer
    Answer { content: String },
    /// Budget exhausted
    LimitReached { iterations: usize },
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub answer: String,
    pub iterations: usize,
    pub completed: bool,
    pub tool_calls: usize,
}

/// Agent orchestrator
pub struct Agent<M: TextModel> {
    model: M,
    tools: ToolRegistry,
    max_iterations: usize,
}

impl<M: TextModel> Agent<M> {
    pub fn new(model: M, tools: ToolRegistry) -> Self {
        Self {
            model,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// System prompt naming the tools and the call protocol
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a helpful AI agent that can use tools to answer questions.\n\n{}\n\nThink step by step. Use tools when needed. When you have the final answer, use ANSWER: format.",
            self.tools.describe()
        )
    }

    /// Answer a question
    pub async fn run(&self, question: &str) -> Result<AgentOutcome> {
        self.run_with(question, &mut |_| {}).await
    }

    /// Answer a question, reporting every step to `on_step`
    pub async fn run_with(
        &self,
        question: &str,
        on_step: &mut (dyn for<'a> FnMut(&'a AgentStep) + Send),
    ) -> Result<AgentOutcome> {
        let mut conversation = vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::human(question),
        ];
        let mut tool_calls = 0;

        info!(question, max_iterations = self.max_iterations, "agent run started");

        for iteration in 1..=self.max_iterations {
            let prompt = flatten(&conversation);
            let reply = self.model.invoke(&prompt).await?;
            let reply = reply.trim().to_string();

            debug!(iteration, reply = %reply, "model reply");
            on_step(&AgentStep::Reply {
                iteration,
                text: reply.clone(),
            });

            match parse_llm_response(&reply) {
                AgentAction::Answer { content } => {
                    info!(iteration, tool_calls, "agent answered");
                    on_step(&AgentStep::Answer {
                        content: content.clone(),
                    });
                    return Ok(AgentOutcome {
                        answer: content,
                        iterations: iteration,
                        completed: true,
                        tool_calls,
                    });
                }
                AgentAction::ToolCall {
                    tool,
                    input,
                    reason,
                } => {
                    conversation.push(ChatMessage::ai(reply.as_str()));
                    on_step(&AgentStep::ToolCall {
                        tool: tool.clone(),
                        input: input.clone(),
                        reason,
                    });

                    let result = self.tools.execute(&tool, &input).await;
                    tool_calls += 1;
                    debug!(
                        tool = %tool,
                        success = result.success,
                        duration_ms = result.duration_ms,
                        "tool finished"
                    );

                    let observation = result.observation().to_string();
                    on_step(&AgentStep::ToolResult {
                        tool,
                        output: observation.clone(),
                        success: result.success,
                    });
                    conversation.push(ChatMessage::human(format!("Tool result: {}", observation)));
                }
                AgentAction::Thought { .. } => {
                    conversation.push(ChatMessage::ai(reply.as_str()));
                    conversation.push(ChatMessage::human(CONTINUE_PROMPT));
                }
            }
        }

        warn!(iterations = self.max_iterations, "agent hit the iteration limit");
        on_step(&AgentStep::LimitReached {
            iterations: self.max_iterations,
        });

        Ok(AgentOutcome {
            answer: ITERATION_LIMIT_MESSAGE.to_string(),
            iterations: self.max_iterations,
            completed: false,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::config::ToolsConfig;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted replies and records the prompts it received
    struct Scripted {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextModel for Scripted {
        async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push(messages[0].content.clone());
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "Still thinking".to_string()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn tools() -> ToolRegistry {
        ToolRegistry::with_defaults(&ToolsConfig::default(), None)
    }

    #[tokio::test]
    async fn test_tool_then_answer() {
        let model = Scripted::new(&[
            "TOOL: calculate\nINPUT: sqrt(144)\nREASON: need the root",
            "ANSWER: The square root of 144 is 12.",
        ]);
        let agent = Agent::new(model, tools());

        let mut steps = Vec::new();
        let outcome = agent
            .run_with("What is the square root of 144?", &mut |s| steps.push(s.clone()))
            .await
            .unwrap();

        assert!(outcome.completed);
        assert_eq!(outcome.answer, "The square root of 144 is 12.");
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.tool_calls, 1);
        assert!(steps.contains(&AgentStep::ToolResult {
            tool: "calculate".to_string(),
            output: "12".to_string(),
            success: true,
        }));

        let prompts = agent.model.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("SYSTEM: You are a helpful AI agent"));
        assert!(prompts[0].ends_with("USER: What is the square root of 144?"));
        assert!(prompts[1].contains("ASSISTANT: TOOL: calculate"));
        assert!(prompts[1].ends_with("USER: Tool result: 12"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let model = Scripted::new(&["TOOL: teleport\nINPUT: Mars", "ANSWER: cannot"]);
        let agent = Agent::new(model, tools());

        let outcome = agent.run("Go to Mars").await.unwrap();
        assert_eq!(outcome.answer, "cannot");

        let prompts = agent.model.prompts.lock().unwrap();
        assert!(prompts[1].ends_with("USER: Tool result: Error: Tool 'teleport' not found"));
    }

    #[tokio::test]
    async fn test_thought_gets_continue_nudge() {
        let model = Scripted::new(&["Let me think.", "ANSWER: done"]);
        let agent = Agent::new(model, tools());

        agent.run("q").await.unwrap();
        let prompts = agent.model.prompts.lock().unwrap();
        assert!(prompts[1].ends_with("ASSISTANT: Let me think.\nUSER: Continue. What's your next action?"));
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let agent = Agent::new(Scripted::new(&[]), tools()).with_max_iterations(3);

        let mut steps = Vec::new();
        let outcome = agent
            .run_with("never ends", &mut |s| steps.push(s.clone()))
            .await
            .unwrap();

        assert!(!outcome.completed);
        assert_eq!(outcome.answer, ITERATION_LIMIT_MESSAGE);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(agent.model.prompts.lock().unwrap().len(), 3);
        assert_eq!(steps.last(), Some(&AgentStep::LimitReached { iterations: 3 }));
    }
}
