//! # plancraft-core
//!
//! Core types, traits, and primitives for the Plancraft planning backend.
//! This crate defines the shared vocabulary used by every other crate in the workspace:
//! chat turns, model messages, tool descriptors, execution traces, and the
//! structured signals the chat agent hands to clients.

pub mod error;
pub mod message;
pub mod signal;
pub mod tool;
pub mod trace;
pub mod types;

pub use error::{PlanError, Result};
pub use message::{ChatTurn, Message, MessageContent, Role, TurnRole};
pub use signal::{AgentResponse, StructuredSignal};
pub use tool::{ParamKind, ParamSpec, Tool, ToolCall, ToolDescriptor, ToolExecutor, ToolResult};
pub use trace::{ExecutionTrace, TraceStep};
pub use types::*;
