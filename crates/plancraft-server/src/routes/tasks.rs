use std::sync::Arc;

use axum::extract::{Extension, Json, Path, State};
use axum::http::StatusCode;
use plancraft_core::{PlanError, ProjectId, TaskId, UserId};
use plancraft_store::{
    NewTaskAssignment, TaskAssignment, TaskAssignmentUpdate, TaskRepository, TaskStatus,
    parse_eta,
};
use serde::Deserialize;

use crate::{ApiResult, AppState, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct CreateTaskBody {
    user_id: UserId,
    project_id: ProjectId,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "type")]
    task_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    eta: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskBody {
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "type")]
    task_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    eta: Option<String>,
}

fn status(raw: Option<&str>) -> Result<Option<TaskStatus>, PlanError> {
    raw.map(|s| {
        s.parse::<TaskStatus>()
            .map_err(|_| PlanError::Validation("Invalid status value".into()))
    })
    .transpose()
}

fn eta(raw: Option<&str>) -> Result<Option<chrono::NaiveDateTime>, PlanError> {
    raw.map(parse_eta).transpose()
}

/// Creates a task assigned by the caller. Status defaults to `todo`.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<CreateTaskBody>,
) -> ApiResult<(StatusCode, Json<TaskAssignment>)> {
    let new = NewTaskAssignment {
        user_id: body.user_id,
        project_id: body.project_id,
        description: body.description,
        task_type: body.task_type,
        status: Some(status(body.status.as_deref())?.unwrap_or(TaskStatus::Todo)),
        eta: eta(body.eta.as_deref())?,
    };
    let task = state.store.create_task(&new, user)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn mine(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<TaskAssignment>>> {
    Ok(Json(state.store.tasks_assigned_to(user)?))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<TaskAssignment>> {
    Ok(Json(state.store.get_task(id)?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TaskId>,
    Json(body): Json<UpdateTaskBody>,
) -> ApiResult<Json<TaskAssignment>> {
    let update = TaskAssignmentUpdate {
        user_id: body.user_id,
        description: body.description,
        task_type: body.task_type,
        status: status(body.status.as_deref())?,
        eta: eta(body.eta.as_deref())?,
    };
    Ok(Json(state.store.update_task(id, &update)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_maps_to_a_single_message() {
        assert_eq!(status(None).unwrap(), None);
        assert_eq!(status(Some("done")).unwrap(), Some(TaskStatus::Done));
        let err = status(Some("finished")).unwrap_err();
        assert_eq!(err.to_string(), "validation failed: Invalid status value");
    }
}
