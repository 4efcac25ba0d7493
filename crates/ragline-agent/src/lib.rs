//! Ragline Agent - Tool-calling agents.
//!
//! A [`ToolAgent`] wraps a reasoning model in a loop: ask the model, run any
//! tools it requests, feed the results back, and stop at a final answer or
//! the iteration cap. The manager role can delegate to an assistant agent
//! through the `ask_assistant` tool.

mod agent;
mod error;
mod roles;
mod tool;
mod tools;

pub use agent::{Agent, DelegatingAgent, RetrievalAgent, ToolAgent};
pub use error::{AgentError, AgentResult};
pub use roles::{AgentParams, AgentRole};
pub use tool::{Tool, ToolSet};
pub use tools::{ContextTool, DelegateTool};
