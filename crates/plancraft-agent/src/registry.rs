use std::sync::Arc;

use async_trait::async_trait;
use plancraft_core::{Result, Tool, ToolCall, ToolDescriptor, ToolExecutor, ToolResult, UserId};
use plancraft_store::TaskRepository;
use tracing::{debug, warn};

use crate::tools::{self, CREATE_TASK, LIST_TASKS_BY_STATUS, Outcome, SHOW_TASK_STATUS};

/// The closed set of tools for one chat query, bound to the caller.
///
/// Built per query and dropped afterwards. The acting user is fixed at
/// construction; no tool argument can change it.
pub struct ToolRegistry {
    acting_user: UserId,
    tasks: Arc<dyn TaskRepository>,
    descriptors: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn for_user(acting_user: UserId, tasks: Arc<dyn TaskRepository>) -> Self {
        Self {
            acting_user,
            tasks,
            descriptors: vec![
                tools::create_task_descriptor(),
                tools::list_tasks_descriptor(),
                tools::show_task_status_descriptor(),
            ],
        }
    }

    pub fn acting_user(&self) -> UserId {
        self.acting_user
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.descriptors.iter().any(|d| d.name == name)
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    fn tools(&self) -> Vec<Tool> {
        self.descriptors.iter().map(ToolDescriptor::to_tool).collect()
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let Some(descriptor) = self.descriptors.iter().find(|d| d.name == call.tool_name) else {
            warn!(tool = %call.tool_name, "model requested an unknown tool");
            return Ok(ToolResult::error(
                call,
                format!("Tool not found: {}", call.tool_name),
            ));
        };

        let args = match descriptor.validate(&call.arguments) {
            Ok(args) => args,
            Err(reason) => {
                debug!(tool = %call.tool_name, %reason, "rejected tool arguments");
                return Ok(ToolResult::error(
                    call,
                    format!("Invalid arguments for {}: {reason}", call.tool_name),
                ));
            }
        };

        let outcome: Outcome = match call.tool_name.as_str() {
            CREATE_TASK => tools::create_task(self.tasks.as_ref(), self.acting_user, &args),
            LIST_TASKS_BY_STATUS => {
                tools::list_tasks_by_status(self.tasks.as_ref(), self.acting_user, &args)
            }
            SHOW_TASK_STATUS => tools::show_task_status(&args),
            other => Err(format!("Tool not found: {other}")),
        };

        debug!(
            tool = %call.tool_name,
            acting_user = self.acting_user,
            ok = outcome.is_ok(),
            "tool executed"
        );
        Ok(match outcome {
            Ok(text) => ToolResult::ok(call, text),
            Err(text) => ToolResult::error(call, text),
        })
    }
}
