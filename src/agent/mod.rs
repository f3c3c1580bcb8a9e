//! Tool-using agent
//!
//! A text-protocol agent: the model picks tools with `TOOL:`/`INPUT:` lines
//! and finishes with `ANSWER:`.

pub mod orchestrator;
pub mod parser;

pub use orchestrator::{
    Agent, AgentOutcome, AgentStep, DEFAULT_MAX_ITERATIONS, ITERATION_LIMIT_MESSAGE,
};
pub use parser::{parse_llm_response, AgentAction};
