use std::sync::Arc;

use plancraft_config::{PlanConfig, ServicesConfig};
use plancraft_core::{AgentResponse, ChatTurn, PlanError, Result, UserId};
use plancraft_llm::{AgentRequest, LlmProvider, ModelClient, ToolCallingClient};
use plancraft_store::TaskRepository;
use tracing::{debug, info};

use crate::extract::extract_tool_action;
use crate::registry::ToolRegistry;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. You have access to tools to assist you.";

/// Answers chat queries with the task tools bound to the asking user.
///
/// Holds no per-query state; every call builds its own [`ToolRegistry`].
pub struct ChatAgent {
    client: Arc<dyn ModelClient>,
    tasks: Arc<dyn TaskRepository>,
    services: ServicesConfig,
}

impl ChatAgent {
    pub fn new(
        client: Arc<dyn ModelClient>,
        tasks: Arc<dyn TaskRepository>,
        services: ServicesConfig,
    ) -> Self {
        Self {
            client,
            tasks,
            services,
        }
    }

    /// Agent over `provider` with the configured model and agent limits.
    pub fn from_config(
        config: &PlanConfig,
        provider: Arc<dyn LlmProvider>,
        tasks: Arc<dyn TaskRepository>,
    ) -> Self {
        let client = ToolCallingClient::new(provider, config.model.model.clone())
            .with_temperature(config.model.agent_temperature)
            .with_max_tokens(config.model.max_tokens)
            .with_max_iterations(config.model.max_iterations);
        Self::new(Arc::new(client), tasks, config.services.clone())
    }

    /// Run one query. `history` is read, never modified.
    pub async fn answer(
        &self,
        query: &str,
        acting_user: UserId,
        history: &[ChatTurn],
    ) -> Result<AgentResponse> {
        self.services.require_api_key()?;

        let registry = ToolRegistry::for_user(acting_user, self.tasks.clone());
        let request = AgentRequest {
            system: SYSTEM_PROMPT.to_string(),
            history: history.to_vec(),
            input: query.to_string(),
        };
        debug!(acting_user, history = history.len(), "dispatching chat query");
        let run = self.client.run(request, &registry).await?;

        let tool_action = extract_tool_action(&run.trace, acting_user);
        let output_text = if !run.output.trim().is_empty() {
            run.output
        } else if let Some(last) = run.trace.steps().last() {
            last.observation.clone()
        } else {
            return Err(PlanError::MalformedOutput(
                "model returned neither text nor tool calls".into(),
            ));
        };

        info!(
            acting_user,
            steps = run.trace.len(),
            tools = ?run.trace.tool_names(),
            signal = tool_action.is_some(),
            "chat query answered"
        );
        Ok(AgentResponse {
            output_text,
            tool_action,
        })
    }
}
