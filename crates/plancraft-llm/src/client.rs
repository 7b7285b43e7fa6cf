use std::sync::Arc;

use async_trait::async_trait;
use plancraft_core::{
    ChatTurn, ExecutionTrace, Message, Result, Role, ToolExecutor, ToolResult, TraceStep,
};
use tracing::{debug, info, warn};

use crate::provider::{LlmProvider, LlmRequest, ResponseFormat, Usage};

/// Final output used when the tool-calling rounds run out.
pub const ITERATION_LIMIT_MESSAGE: &str = "Agent stopped due to iteration limit.";

/// One query handed to a [`ModelClient`].
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub system: String,
    pub history: Vec<ChatTurn>,
    pub input: String,
}

/// Everything a [`ModelClient`] produced while answering one query.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// Final answer text.
    pub output: String,
    /// Every tool invocation made en route, in order.
    pub trace: ExecutionTrace,
    pub usage: Usage,
}

/// Answers a query, invoking tools from `tools` as the model decides, and
/// reports the full execution trace alongside the final text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn run(&self, request: AgentRequest, tools: &dyn ToolExecutor) -> Result<AgentRun>;
}

/// [`ModelClient`] over any [`LlmProvider`]: call the model, execute the tools it
/// asks for, feed the observations back, repeat until it answers in text.
pub struct ToolCallingClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_iterations: u32,
}

impl ToolCallingClient {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: 8192,
            max_iterations: 10,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

#[async_trait]
impl ModelClient for ToolCallingClient {
    async fn run(&self, request: AgentRequest, executor: &dyn ToolExecutor) -> Result<AgentRun> {
        let tools = executor.tools();
        let mut messages: Vec<Message> = request.history.iter().map(Message::from).collect();
        messages.push(Message::text(Role::User, request.input));

        let mut trace = ExecutionTrace::new();
        let mut usage = Usage::default();
        let mut iteration = 0;

        loop {
            iteration += 1;
            if iteration > self.max_iterations {
                warn!(
                    max_iterations = self.max_iterations,
                    steps = trace.len(),
                    "max agent iterations reached"
                );
                return Ok(AgentRun {
                    output: ITERATION_LIMIT_MESSAGE.to_string(),
                    trace,
                    usage,
                });
            }

            let llm_request = LlmRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                tools: tools.clone(),
                system: Some(request.system.clone()),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                response_format: ResponseFormat::Text,
            };

            let response = self.provider.complete(&llm_request).await?;
            usage.merge(&response.usage);

            if response.message.tool_calls.is_empty() {
                info!(
                    iterations = iteration,
                    steps = trace.len(),
                    tokens = usage.total_tokens(),
                    "agent run complete"
                );
                return Ok(AgentRun {
                    output: response.message.text_content(),
                    trace,
                    usage,
                });
            }

            let calls = response.message.tool_calls.clone();
            messages.push(response.message);

            for call in &calls {
                debug!(tool = %call.tool_name, id = %call.id, "executing tool call");
                let result = match executor.execute(call).await {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(tool = %call.tool_name, error = %e, "tool execution failed");
                        ToolResult::error(call, format!("Error: {e}"))
                    }
                };
                trace.push(TraceStep {
                    call: call.clone(),
                    observation: result.content.clone(),
                    is_error: result.is_error,
                });
                messages.push(Message::tool_result(&result, &call.tool_name));
            }
        }
    }
}
