use std::sync::Arc;

use axum::extract::{Extension, Json, Path, State};
use axum::http::StatusCode;
use plancraft_core::{ProjectId, UserId};
use plancraft_store::{NewProject, NewUserProject, Project, ProjectUpdate, UserProject};

use crate::{ApiResult, AppState, CurrentUser};

// ── Projects (scoped to the caller as owner) ───────────────────

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<NewProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state.store.create_project(&body, user)?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.store.projects_owned_by(user)?))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.store.get_project(id, user)?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<ProjectId>,
    Json(body): Json<ProjectUpdate>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.store.update_project(id, user, &body)?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<ProjectId>,
) -> ApiResult<StatusCode> {
    state.store.delete_project(id, user)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Memberships ────────────────────────────────────────────────

pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewUserProject>,
) -> ApiResult<(StatusCode, Json<UserProject>)> {
    let link = state.store.add_user_to_project(&body)?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn projects_of_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> ApiResult<Json<Vec<UserProject>>> {
    Ok(Json(state.store.projects_of_user(id)?))
}

pub async fn members_of_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<Vec<UserProject>>> {
    Ok(Json(state.store.members_of_project(id)?))
}

pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.store.remove_user_project(id)?;
    Ok(StatusCode::NO_CONTENT)
}
