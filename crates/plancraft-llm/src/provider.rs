use async_trait::async_trait;
use plancraft_core::{Message, Result, Tool};
use serde::{Deserialize, Serialize};

/// Shape the provider should constrain its output to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    /// The provider must answer with a JSON document.
    Json,
}

/// A request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The model to use, e.g. "gemini-1.5-flash".
    pub model: String,
    /// Conversation history.
    pub messages: Vec<Message>,
    /// Available tools.
    pub tools: Vec<Tool>,
    /// System instruction (separate from messages).
    pub system: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature.
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl LlmRequest {
    /// A single-turn request with no tools.
    pub fn prompt(model: &str, system: Option<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![Message::text(plancraft_core::Role::User, user)],
            tools: vec![],
            system,
            max_tokens: 8192,
            temperature: 0.2,
            response_format: ResponseFormat::Text,
        }
    }
}

/// A complete response from an LLM.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub message: Message,
    pub usage: Usage,
    /// Whether the model wants to continue (has tool calls).
    pub has_tool_calls: bool,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    ContentFilter,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    pub fn merge(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Trait implemented by each hosted model provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable name, e.g. "gemini".
    fn name(&self) -> &str;

    /// List available models.
    fn models(&self) -> Vec<String>;

    /// Send a request and wait for the full response.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;

    /// Check if this provider is usable.
    async fn health_check(&self) -> Result<()>;
}
