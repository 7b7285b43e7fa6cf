use serde::{Deserialize, Serialize};

use crate::types::{TaskId, UserId};

/// A machine-readable payload extracted from a recognized tool invocation.
///
/// Wire shape: `{"type": "show_task_status", "task_id": 21, "user_id": 7}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructuredSignal {
    /// The model decided the client should display the status of a task.
    ShowTaskStatus { task_id: TaskId, user_id: UserId },
}

/// What the chat agent returns for one query.
///
/// `tool_action` is `Some` exactly when the execution trace contained a
/// well-formed invocation of a signal-producing tool; the first one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub output_text: String,
    pub tool_action: Option<StructuredSignal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_task_status_wire_shape() {
        let signal = StructuredSignal::ShowTaskStatus {
            task_id: 21,
            user_id: 7,
        };
        let value = serde_json::to_value(signal).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "show_task_status", "task_id": 21, "user_id": 7})
        );
    }

    #[test]
    fn absent_tool_action_serializes_as_null() {
        let resp = AgentResponse {
            output_text: "hi".into(),
            tool_action: None,
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value["tool_action"].is_null());
    }
}
