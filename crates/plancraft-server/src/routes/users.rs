use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use plancraft_core::UserId;
use plancraft_store::{NewUser, User};
use serde::Deserialize;

use crate::{ApiResult, AppState};

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.store.create_user(&body)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.store.get_user(id)?))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
}

/// Employees of a company whose name starts with `q`, ignoring case.
pub async fn search_employees(
    State(state): State<Arc<AppState>>,
    Path(company): Path<String>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(
        state.store.search_company_employees(&company, params.q.trim())?,
    ))
}
