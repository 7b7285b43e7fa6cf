use async_trait::async_trait;
use plancraft_core::{Message, MessageContent, PlanError, Result, Role, ToolCall};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::provider::*;

/// Google Generative Language API provider (`generateContent`).
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }

    /// Use a custom base URL (proxies, regional endpoints, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model_id(model))
    }
}

/// Strip an optional "gemini/" or "models/" prefix from a model name.
fn model_id(model: &str) -> &str {
    let m = model.strip_prefix("gemini/").unwrap_or(model);
    m.strip_prefix("models/").unwrap_or(m)
}

/// Build the `generateContent` request body.
pub(crate) fn build_body(request: &LlmRequest) -> Value {
    let mut contents: Vec<Value> = Vec::new();

    for msg in &request.messages {
        match msg.role {
            Role::System | Role::User => {
                contents.push(json!({
                    "role": "user",
                    "parts": [{"text": msg.text_content()}],
                }));
            }
            Role::Assistant => {
                let mut parts = Vec::new();
                let text = msg.text_content();
                if !text.is_empty() {
                    parts.push(json!({"text": text}));
                }
                for tc in &msg.tool_calls {
                    parts.push(json!({
                        "functionCall": {"name": tc.tool_name, "args": tc.arguments}
                    }));
                }
                if parts.is_empty() {
                    parts.push(json!({"text": ""}));
                }
                contents.push(json!({"role": "model", "parts": parts}));
            }
            Role::Tool => {
                let parts: Vec<Value> = msg
                    .content
                    .iter()
                    .filter_map(|c| match c {
                        MessageContent::ToolResult {
                            tool_name, content, ..
                        } => Some(json!({
                            "functionResponse": {
                                "name": tool_name,
                                "response": {"name": tool_name, "content": content},
                            }
                        })),
                        MessageContent::Text { .. } => None,
                    })
                    .collect();
                if parts.is_empty() {
                    contents.push(json!({
                        "role": "user",
                        "parts": [{"text": msg.text_content()}],
                    }));
                    continue;
                }
                // All responses to one model turn travel in a single content entry.
                let merge = contents.last().is_some_and(|last| {
                    last["role"] == "user"
                        && last["parts"][0].get("functionResponse").is_some()
                });
                if merge {
                    if let Some(arr) = contents
                        .last_mut()
                        .and_then(|last| last["parts"].as_array_mut())
                    {
                        arr.extend(parts);
                    }
                } else {
                    contents.push(json!({"role": "user", "parts": parts}));
                }
            }
        }
    }

    let mut generation = json!({
        "temperature": request.temperature,
        "maxOutputTokens": request.max_tokens,
    });
    if request.response_format == ResponseFormat::Json {
        generation["responseMimeType"] = json!("application/json");
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation,
    });

    if let Some(ref system) = request.system {
        body["systemInstruction"] = json!({"parts": [{"text": system}]});
    }

    if !request.tools.is_empty() {
        let decls: Vec<Value> = request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                })
            })
            .collect();
        body["tools"] = json!([{"functionDeclarations": decls}]);
    }

    body
}

/// Parse a `generateContent` response body.
pub(crate) fn parse_response(data: &Value) -> Result<LlmResponse> {
    let Some(candidate) = data["candidates"].get(0) else {
        let reason = data["promptFeedback"]["blockReason"]
            .as_str()
            .unwrap_or("no candidates returned");
        return Err(PlanError::LlmProvider(format!(
            "empty response from model: {reason}"
        )));
    };

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    if let Some(parts) = candidate["content"]["parts"].as_array() {
        for part in parts {
            if let Some(t) = part["text"].as_str() {
                text.push_str(t);
            } else if let Some(fc) = part.get("functionCall") {
                let Some(name) = fc["name"].as_str() else {
                    continue;
                };
                tool_calls.push(ToolCall {
                    id: fc["id"]
                        .as_str()
                        .map(String::from)
                        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4())),
                    tool_name: name.to_string(),
                    arguments: fc.get("args").cloned().unwrap_or_else(|| json!({})),
                });
            }
        }
    }

    let has_tool_calls = !tool_calls.is_empty();
    let mut message = Message::text(Role::Assistant, text);
    message.tool_calls = tool_calls;

    let finish_reason = candidate["finishReason"].as_str().unwrap_or("");
    let usage_data = &data["usageMetadata"];
    let usage = Usage {
        input_tokens: usage_data["promptTokenCount"].as_u64().unwrap_or(0) as u32,
        output_tokens: usage_data["candidatesTokenCount"].as_u64().unwrap_or(0) as u32,
    };

    Ok(LlmResponse {
        message,
        usage,
        has_tool_calls,
        stop_reason: match finish_reason {
            "MAX_TOKENS" => StopReason::MaxTokens,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => {
                StopReason::ContentFilter
            }
            _ if has_tool_calls => StopReason::ToolUse,
            _ => StopReason::EndTurn,
        },
    })
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn models(&self) -> Vec<String> {
        vec![
            "gemini-1.5-flash".into(),
            "gemini-1.5-pro".into(),
            "gemini-2.0-flash".into(),
        ]
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let body = build_body(request);
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending generateContent request"
        );

        let resp = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PlanError::LlmProvider(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PlanError::LlmProvider(format!("HTTP {status}: {text}")));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| PlanError::LlmProvider(e.to_string()))?;

        parse_response(&data)
    }

    async fn health_check(&self) -> Result<()> {
        info!(provider = "gemini", "checking API health");
        if self.api_key.is_empty() {
            return Err(PlanError::LlmProvider("gemini API key not set".into()));
        }
        Ok(())
    }
}
