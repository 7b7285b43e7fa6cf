//! # plancraft-llm
//!
//! Model client layer. A provider abstraction with a Gemini adapter and a
//! deterministic mock, plus the tool-calling loop that turns a provider into a
//! [`ModelClient`] returning the final answer together with its execution trace.

pub mod client;
pub mod gemini;
pub mod mock;
pub mod provider;

pub use client::{AgentRequest, AgentRun, ITERATION_LIMIT_MESSAGE, ModelClient, ToolCallingClient};
pub use gemini::GeminiProvider;
pub use mock::{MockProvider, MockResponse};
pub use provider::{LlmProvider, LlmRequest, LlmResponse, ResponseFormat, StopReason, Usage};
