use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::config::BackendConfig;
use crate::state::SharedState;
use crate::workbench::selection::SelectionState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub projects: usize,
    pub models: usize,
    pub evaluations: usize,
    pub selection: SelectionState,
    pub version: String,
}

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let workbench = &state.workbench;
    let backend = match &state.config.backend {
        BackendConfig::Fixture { path, .. } => format!("fixture:{}", path.display()),
        BackendConfig::Http { base } => format!("http:{}", base),
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        backend,
        projects: workbench.catalog().projects().len(),
        models: workbench.catalog().models().len(),
        evaluations: workbench.repository().len(),
        selection: workbench.selection().state(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
