use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use plancraft_core::{FeatureId, MilestoneId, ProjectId};
use plancraft_store::{
    Feature, FeatureUpdate, Milestone, MilestoneUpdate, NewFeature, NewMilestone,
    NewTechStackItem, TechStackItem, TechStackUpdate,
};

use crate::{ApiResult, AppState};

// ── Milestones ─────────────────────────────────────────────────

pub async fn create_milestone(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewMilestone>,
) -> ApiResult<(StatusCode, Json<Milestone>)> {
    Ok((StatusCode::CREATED, Json(state.store.create_milestone(&body)?)))
}

pub async fn milestones_for_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<Vec<Milestone>>> {
    Ok(Json(state.store.milestones_for_project(id)?))
}

pub async fn get_milestone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MilestoneId>,
) -> ApiResult<Json<Milestone>> {
    Ok(Json(state.store.get_milestone(id)?))
}

pub async fn update_milestone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MilestoneId>,
    Json(body): Json<MilestoneUpdate>,
) -> ApiResult<Json<Milestone>> {
    Ok(Json(state.store.update_milestone(id, &body)?))
}

pub async fn delete_milestone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MilestoneId>,
) -> ApiResult<StatusCode> {
    state.store.delete_milestone(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Features ───────────────────────────────────────────────────

pub async fn create_feature(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewFeature>,
) -> ApiResult<(StatusCode, Json<Feature>)> {
    Ok((StatusCode::CREATED, Json(state.store.create_feature(&body)?)))
}

pub async fn features_for_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<Vec<Feature>>> {
    Ok(Json(state.store.features_for_project(id)?))
}

pub async fn features_for_milestone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MilestoneId>,
) -> ApiResult<Json<Vec<Feature>>> {
    Ok(Json(state.store.features_for_milestone(id)?))
}

pub async fn get_feature(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FeatureId>,
) -> ApiResult<Json<Feature>> {
    Ok(Json(state.store.get_feature(id)?))
}

pub async fn update_feature(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FeatureId>,
    Json(body): Json<FeatureUpdate>,
) -> ApiResult<Json<Feature>> {
    Ok(Json(state.store.update_feature(id, &body)?))
}

pub async fn delete_feature(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FeatureId>,
) -> ApiResult<StatusCode> {
    state.store.delete_feature(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Tech stack ─────────────────────────────────────────────────

pub async fn create_tech(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewTechStackItem>,
) -> ApiResult<(StatusCode, Json<TechStackItem>)> {
    Ok((StatusCode::CREATED, Json(state.store.create_tech(&body)?)))
}

pub async fn tech_for_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<Vec<TechStackItem>>> {
    Ok(Json(state.store.tech_for_project(id)?))
}

pub async fn get_tech(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TechStackItem>> {
    Ok(Json(state.store.get_tech(id)?))
}

pub async fn update_tech(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<TechStackUpdate>,
) -> ApiResult<Json<TechStackItem>> {
    Ok(Json(state.store.update_tech(id, &body)?))
}

pub async fn delete_tech(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.store.delete_tech(id)?;
    Ok(StatusCode::NO_CONTENT)
}
