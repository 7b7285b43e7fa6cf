use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use plancraft_core::ProjectId;
use plancraft_store::{NewProjectUml, ProjectUml};

use crate::{ApiResult, AppState};

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewProjectUml>,
) -> ApiResult<(StatusCode, Json<ProjectUml>)> {
    Ok((StatusCode::CREATED, Json(state.store.create_uml(&body)?)))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProjectUml>> {
    Ok(Json(state.store.get_uml(id)?))
}

pub async fn for_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<Vec<ProjectUml>>> {
    Ok(Json(state.store.umls_for_project(id)?))
}

pub async fn replace(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<NewProjectUml>,
) -> ApiResult<Json<ProjectUml>> {
    Ok(Json(state.store.replace_uml(id, &body)?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.store.delete_uml(id)?;
    Ok(StatusCode::NO_CONTENT)
}
