//! # plancraft-agent
//!
//! The chat agent and the prompt chains.
//!
//! - [`ToolRegistry`] holds the task tools for one query, bound to the caller.
//! - [`ChatAgent`] runs a query through a [`plancraft_llm::ModelClient`] and
//!   derives an [`plancraft_core::AgentResponse`] from the execution trace.
//! - [`chains::ChainRunner`] renders planning prompts and calls the model once.

pub mod chains;
pub mod dispatch;
pub mod extract;
pub mod registry;
pub mod tools;

pub use chains::ChainRunner;
pub use dispatch::{ChatAgent, SYSTEM_PROMPT};
pub use extract::{StepMatch, extract_tool_action, inspect_step, normalize_task_id};
pub use registry::ToolRegistry;
