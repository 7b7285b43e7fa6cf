//! The three task tools the chat agent may call, and their handlers.
//!
//! Handlers never see a caller-supplied identity: the acting user is passed in
//! by the registry that owns them.

use plancraft_core::{ParamKind, ParamSpec, ToolDescriptor, UserId};
use plancraft_store::{NewTaskAssignment, TaskAssignment, TaskRepository, TaskStatus, parse_eta};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

pub const CREATE_TASK: &str = "create_task";
pub const LIST_TASKS_BY_STATUS: &str = "list_tasks_by_status";
pub const SHOW_TASK_STATUS: &str = "show_task_status";

/// Observation text, `Err` when the call failed but should still reach the model.
pub(crate) type Outcome = std::result::Result<String, String>;

pub fn create_task_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: CREATE_TASK.into(),
        description: "Creates a new task assignment in the database. The current user is \
                      recorded as the one who assigned it."
            .into(),
        params: vec![
            ParamSpec::required(
                "description",
                ParamKind::String,
                "A detailed description of the task.",
            ),
            ParamSpec::required(
                "project_id",
                ParamKind::Integer,
                "The ID of the project the task belongs to.",
            ),
            ParamSpec::required(
                "assignee_user_id",
                ParamKind::Integer,
                "The ID of the user to whom the task is assigned.",
            ),
            ParamSpec::optional(
                "task_type",
                ParamKind::String,
                "The type of task, e.g. \"development\", \"bug\", \"research\".",
            )
            .with_default(json!("development")),
            ParamSpec::optional(
                "status",
                ParamKind::String,
                "The task status: \"todo\", \"in-progress\", \"blocked\" or \"done\".",
            )
            .with_default(json!("todo")),
            ParamSpec::optional(
                "eta",
                ParamKind::DateTime,
                "Estimated completion in ISO 8601 format, e.g. \"2025-12-31T23:59:59\".",
            ),
        ],
    }
}

pub fn list_tasks_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: LIST_TASKS_BY_STATUS.into(),
        description: "Lists the tasks assigned to the current user, optionally filtered by \
                      status. Without a status, returns tasks that are todo or in progress."
            .into(),
        params: vec![ParamSpec::optional(
            "status",
            ParamKind::String,
            "Status to filter by: \"todo\", \"in-progress\", \"blocked\" or \"done\".",
        )],
    }
}

pub fn show_task_status_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: SHOW_TASK_STATUS.into(),
        description: "Shows the user the current status of one task. Use this when the user \
                      asks about the status of a specific task."
            .into(),
        params: vec![ParamSpec::required(
            "task_id",
            ParamKind::Integer,
            "The ID of the task to show.",
        )],
    }
}

fn str_arg<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn int_arg(args: &Map<String, Value>, key: &str) -> Option<i64> {
    args.get(key).and_then(Value::as_i64)
}

pub(crate) fn create_task(
    tasks: &dyn TaskRepository,
    acting_user: UserId,
    args: &Map<String, Value>,
) -> Outcome {
    let (Some(project_id), Some(assignee)) =
        (int_arg(args, "project_id"), int_arg(args, "assignee_user_id"))
    else {
        return Err("Failed to create task: project_id and assignee_user_id are required".into());
    };
    let status = str_arg(args, "status")
        .map(str::parse::<TaskStatus>)
        .transpose()
        .map_err(|e| format!("Failed to create task: {e}"))?;
    let eta = str_arg(args, "eta")
        .map(parse_eta)
        .transpose()
        .map_err(|e| format!("Failed to create task: {e}"))?;

    let new = NewTaskAssignment {
        user_id: assignee,
        project_id,
        description: str_arg(args, "description").map(str::to_string),
        task_type: str_arg(args, "task_type").map(str::to_string),
        status,
        eta,
    };

    match tasks.create_task(&new, acting_user) {
        Ok(task) => {
            debug!(task = task.id, acting_user, "agent created task");
            Ok(format!(
                "Task created successfully with ID {} for user {} in project {}.",
                task.id, task.user_id, task.project_id
            ))
        }
        Err(e) => {
            warn!(error = %e, acting_user, "agent task creation failed");
            Err(format!("Failed to create task: {e}"))
        }
    }
}

fn describe_filter(statuses: &[TaskStatus]) -> String {
    statuses
        .iter()
        .map(TaskStatus::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}

fn format_task(task: &TaskAssignment) -> String {
    format!(
        "- Task ID: {}, Description: {}, Type: {}, Status: {}, Project ID: {}, ETA: {}",
        task.id,
        task.description.as_deref().unwrap_or("N/A"),
        task.task_type.as_deref().unwrap_or("N/A"),
        task.status.map(|s| s.as_str()).unwrap_or("N/A"),
        task.project_id,
        task.eta
            .map(|e| e.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".into()),
    )
}

pub(crate) fn list_tasks_by_status(
    tasks: &dyn TaskRepository,
    acting_user: UserId,
    args: &Map<String, Value>,
) -> Outcome {
    let statuses = match str_arg(args, "status") {
        Some(raw) => vec![
            raw.parse::<TaskStatus>()
                .map_err(|e| format!("Failed to list tasks: {e}"))?,
        ],
        None => TaskStatus::OPEN.to_vec(),
    };
    let found = tasks
        .tasks_for_user(acting_user, &statuses)
        .map_err(|e| format!("Failed to list tasks: {e}"))?;

    let filter = describe_filter(&statuses);
    if found.is_empty() {
        return Ok(format!(
            "No tasks found for user {acting_user} with status {filter}."
        ));
    }
    let lines: Vec<String> = found.iter().map(format_task).collect();
    Ok(format!(
        "Tasks for user {acting_user} with status {filter}:\n{}",
        lines.join("\n")
    ))
}

pub(crate) fn show_task_status(args: &Map<String, Value>) -> Outcome {
    match int_arg(args, "task_id") {
        Some(id) if id > 0 => Ok(format!("Displaying the status of task {id}.")),
        _ => Err("task_id must be a positive integer".into()),
    }
}
