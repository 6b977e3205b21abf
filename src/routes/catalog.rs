use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{WorkbenchError, WorkbenchResult};
use crate::state::SharedState;
use crate::workbench::catalog::ProjectSummary;
use crate::workbench::{Model, Project};

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// GET /api/projects
pub async fn list_projects(State(state): State<SharedState>) -> Json<Vec<Project>> {
    Json(state.workbench.catalog().projects().to_vec())
}

/// GET /api/projects/recent
pub async fn recent_projects(
    State(state): State<SharedState>,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<Project>> {
    Json(state.workbench.catalog().recent_projects(query.limit).to_vec())
}

/// GET /api/projects/{id}: project plus how many evaluations belong to it.
pub async fn get_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> WorkbenchResult<Json<ProjectSummary>> {
    let workbench = &state.workbench;
    let count = workbench.repository().count_for_project(&id);
    workbench
        .catalog()
        .project_summary(&id, count)
        .map(Json)
        .ok_or_else(|| WorkbenchError::not_found("Project", id))
}

/// GET /api/models
pub async fn list_models(State(state): State<SharedState>) -> Json<Vec<Model>> {
    Json(state.workbench.catalog().models().to_vec())
}
