//! Structured-signal extraction from an execution trace.

use plancraft_core::{ExecutionTrace, StructuredSignal, TaskId, TraceStep, UserId};
use serde_json::Value;
use tracing::debug;

use crate::tools::SHOW_TASK_STATUS;

/// Outcome of inspecting one trace step for a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepMatch {
    Matched(StructuredSignal),
    NotThisTool,
    /// The tool matched but its argument could not be read as a task id.
    MalformedArgument,
}

/// Read a task id out of any of the shapes a model may serialize it as.
///
/// Accepted: `{"task_id": 21}`, `{"task_id": "21"}`, `21`, `21.0`, `"21"`,
/// and a string holding a JSON mapping. Ids must be positive.
pub fn normalize_task_id(raw: &Value) -> Option<TaskId> {
    match raw {
        Value::Object(map) => map.get("task_id").and_then(scalar_id),
        other => scalar_id(other),
    }
}

fn scalar_id(raw: &Value) -> Option<TaskId> {
    let id = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(id) => id,
                Err(_) => match serde_json::from_str::<Value>(s).ok()? {
                    Value::Object(map) => map.get("task_id").and_then(scalar_id)?,
                    _ => return None,
                },
            }
        }
        _ => return None,
    };
    (id > 0).then_some(id)
}

/// Classify one step. Only `show_task_status` produces a signal.
pub fn inspect_step(step: &TraceStep, acting_user: UserId) -> StepMatch {
    if step.call.tool_name != SHOW_TASK_STATUS {
        return StepMatch::NotThisTool;
    }
    match normalize_task_id(&step.call.arguments) {
        Some(task_id) => StepMatch::Matched(StructuredSignal::ShowTaskStatus {
            task_id,
            user_id: acting_user,
        }),
        None => StepMatch::MalformedArgument,
    }
}

/// The first well-formed signal in trace order, if any.
pub fn extract_tool_action(trace: &ExecutionTrace, acting_user: UserId) -> Option<StructuredSignal> {
    for (index, step) in trace.steps().iter().enumerate() {
        match inspect_step(step, acting_user) {
            StepMatch::Matched(signal) => {
                debug!(step = index, ?signal, "structured signal extracted");
                return Some(signal);
            }
            StepMatch::MalformedArgument => {
                debug!(step = index, arguments = %step.call.arguments, "skipping malformed signal argument");
            }
            StepMatch::NotThisTool => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use plancraft_core::ToolCall;
    use serde_json::json;

    fn step(tool: &str, args: Value) -> TraceStep {
        TraceStep {
            call: ToolCall {
                id: "c".into(),
                tool_name: tool.into(),
                arguments: args,
            },
            observation: "ok".into(),
            is_error: false,
        }
    }

    #[test]
    fn normalizes_every_known_shape() {
        for raw in [
            json!({"task_id": 21}),
            json!({"task_id": "21"}),
            json!({"task_id": 21.0}),
            json!(21),
            json!("21"),
            json!(" 21 "),
            json!("{\"task_id\": 21}"),
        ] {
            assert_eq!(normalize_task_id(&raw), Some(21), "shape {raw}");
        }
    }

    #[test]
    fn rejects_unreadable_shapes() {
        for raw in [
            json!({"id": 21}),
            json!({"task_id": null}),
            json!("twenty-one"),
            json!(21.5),
            json!(0),
            json!(-3),
            json!([21]),
            json!(null),
            json!(true),
        ] {
            assert_eq!(normalize_task_id(&raw), None, "shape {raw}");
        }
    }

    #[test]
    fn step_classification() {
        assert_eq!(
            inspect_step(&step("create_task", json!({"task_id": 1})), 7),
            StepMatch::NotThisTool
        );
        assert_eq!(
            inspect_step(&step(SHOW_TASK_STATUS, json!({"task": 1})), 7),
            StepMatch::MalformedArgument
        );
        assert_eq!(
            inspect_step(&step(SHOW_TASK_STATUS, json!(5)), 7),
            StepMatch::Matched(StructuredSignal::ShowTaskStatus {
                task_id: 5,
                user_id: 7
            })
        );
    }

    #[test]
    fn first_well_formed_step_wins() {
        let trace: ExecutionTrace = vec![
            step("list_tasks_by_status", json!({})),
            step(SHOW_TASK_STATUS, json!({"task_id": "abc"})),
            step(SHOW_TASK_STATUS, json!({"task_id": 8})),
            step(SHOW_TASK_STATUS, json!({"task_id": 9})),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            extract_tool_action(&trace, 3),
            Some(StructuredSignal::ShowTaskStatus {
                task_id: 8,
                user_id: 3
            })
        );
    }

    #[test]
    fn empty_trace_has_no_action() {
        assert_eq!(extract_tool_action(&ExecutionTrace::new(), 1), None);
    }
}
