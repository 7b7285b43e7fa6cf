use std::sync::Arc;

use axum::extract::{Extension, Json, State};
use axum::http::StatusCode;
use plancraft_agent::chains::{
    DependencyAnalysis, DependencyInput, FeatureBreakdown, MilestonesInput, PlanOutput,
    RoadmapInput, SystemDesignInput, TasksInput,
};
use plancraft_core::{PlanError, ProjectId};
use plancraft_store::{NewProjectUml, ProjectUml};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{ApiResult, AppState, CurrentUser};

// ── Planning chains ────────────────────────────────────────────

pub async fn roadmap(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RoadmapInput>,
) -> ApiResult<Json<Value>> {
    let roadmap = state.chains()?.generate_roadmap(&body).await?;
    Ok(Json(json!({ "roadmap": roadmap })))
}

pub async fn milestones(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MilestonesInput>,
) -> ApiResult<Json<Value>> {
    let milestones = state.chains()?.generate_milestones(&body).await?;
    Ok(Json(json!({ "milestones": milestones })))
}

pub async fn tasks(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TasksInput>,
) -> ApiResult<Json<Value>> {
    let tasks = state.chains()?.generate_tasks(&body).await?;
    Ok(Json(json!({ "tasks": tasks })))
}

pub async fn plan(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RoadmapInput>,
) -> ApiResult<Json<PlanOutput>> {
    Ok(Json(state.chains()?.generate_plan(&body).await?))
}

// ── System design ──────────────────────────────────────────────

/// Generates a UML design and stores it, attached to the project when one
/// is named. The caller must own that project.
pub async fn system_design(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<SystemDesignInput>,
) -> ApiResult<(StatusCode, Json<ProjectUml>)> {
    if let Some(project) = body.project_id {
        state.store.get_project(project, user)?;
    }
    let design = state.chains()?.generate_system_design(&body).await?;
    let uml = state.store.create_uml(&NewProjectUml {
        project_id: body.project_id,
        uml_type: design.design_type,
        uml_schema: serde_json::to_value(&design.uml_schema).map_err(PlanError::from)?,
    })?;
    Ok((StatusCode::CREATED, Json(uml)))
}

pub async fn system_design_text(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SystemDesignInput>,
) -> ApiResult<Json<Value>> {
    let design = state.chains()?.generate_system_design_text(&body).await?;
    Ok(Json(json!({ "system_design": design })))
}

// ── Feature analysis ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DependencyRequest {
    project_id: ProjectId,
    new_feature: String,
}

/// Renders the project's features, milestones and tech stack as context,
/// then asks which existing features the new one depends on.
pub async fn analyze_dependencies(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<DependencyRequest>,
) -> ApiResult<Json<DependencyAnalysis>> {
    let project = state.store.get_project(body.project_id, user)?;
    let milestones = state.store.milestones_for_project(project.id)?;
    let features = state.store.features_for_project(project.id)?;
    let tech = state.store.tech_for_project(project.id)?;

    let milestone_name = |id: Option<i64>| {
        id.and_then(|id| milestones.iter().find(|m| m.id == id))
            .map(|m| m.name.as_str())
            .unwrap_or("none")
    };
    let input = DependencyInput {
        project_name: project.name.clone(),
        features: bulleted(
            features
                .iter()
                .map(|f| {
                    format!(
                        "{}: {} (milestone: {}, status: {})",
                        f.id,
                        f.name,
                        milestone_name(f.milestone_id),
                        f.status
                    )
                })
                .collect(),
        ),
        milestones: bulleted(
            milestones
                .iter()
                .map(|m| format!("{}{}", m.name, if m.done { " (done)" } else { "" }))
                .collect(),
        ),
        tech_stack: bulleted(
            tech.iter()
                .map(|t| format!("{} (level {})", t.tech, t.level))
                .collect(),
        ),
        new_feature: body.new_feature,
    };

    Ok(Json(
        state.chains()?.analyze_feature_dependencies(&input).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct BreakdownRequest {
    feature_description: String,
}

pub async fn breakdown(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BreakdownRequest>,
) -> ApiResult<Json<FeatureBreakdown>> {
    Ok(Json(
        state
            .chains()?
            .breakdown_feature(&body.feature_description)
            .await?,
    ))
}

fn bulleted(lines: Vec<String>) -> String {
    if lines.is_empty() {
        return "None".to_string();
    }
    lines
        .iter()
        .map(|l| format!("- {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}
