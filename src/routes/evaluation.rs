use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::activity::{ActivityLevel, ActivitySource};
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::state::SharedState;
use crate::workbench::selection::{SelectOutcome, SelectionState};
use crate::workbench::view::EvaluationView;
use crate::workbench::{Evaluation, Filter, JudgeScore, TestResult};

// ============================================================================
// Request/Response types
// ============================================================================

/// Query string of the evaluation list: `?project=&status=&model=`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub project: Option<String>,
    pub status: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub user_input: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub evaluations: usize,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub selection: SelectionState,
    pub view: Option<EvaluationView>,
    /// False when a newer selection replaced this one before it settled.
    pub applied: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/evaluations
pub async fn list_evaluations(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> WorkbenchResult<Json<Vec<Evaluation>>> {
    let filter = Filter::from_params(
        query.project.as_deref(),
        query.status.as_deref(),
        query.model.as_deref(),
    )
    .map_err(WorkbenchError::InvalidInput)?;
    Ok(Json(state.workbench.repository().list(&filter)))
}

/// POST /api/evaluations/refresh
pub async fn refresh_evaluations(
    State(state): State<SharedState>,
) -> WorkbenchResult<Json<RefreshResponse>> {
    let evaluations = state.workbench.repository().refresh().await?;
    info!("Evaluation list refreshed ({} evaluations)", evaluations);
    Ok(Json(RefreshResponse { evaluations }))
}

/// GET /api/evaluations/{id}
pub async fn get_evaluation(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> WorkbenchResult<Json<Evaluation>> {
    Ok(Json(state.workbench.repository().get(&id)?))
}

/// GET /api/evaluations/{id}/results
pub async fn test_results(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> WorkbenchResult<Json<Vec<TestResult>>> {
    let repository = state.workbench.repository();
    repository.get(&id)?;
    Ok(Json(repository.test_results(&id).await?))
}

/// GET /api/evaluations/{id}/logs
pub async fn logs(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> WorkbenchResult<String> {
    let repository = state.workbench.repository();
    repository.get(&id)?;
    repository.logs(&id).await
}

/// GET /api/evaluations/{id}/judge: `null` when the evaluation is unscored.
pub async fn judge_score(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> WorkbenchResult<Json<Option<JudgeScore>>> {
    let repository = state.workbench.repository();
    repository.get(&id)?;
    Ok(Json(repository.judge_score(&id).await?))
}

/// POST /api/evaluations/{id}/run
pub async fn run_evaluation(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<RunRequest>,
) -> WorkbenchResult<Json<Evaluation>> {
    match state.workbench.run(&id, &body.prompt, &body.user_input).await {
        Ok(evaluation) => {
            info!("Evaluation {} finished: {}", id, evaluation.status);
            state
                .activity
                .emit(
                    ActivitySource::Run,
                    ActivityLevel::Info,
                    format!("Evaluation {} finished with status {}", id, evaluation.status),
                )
                .await;
            Ok(Json(evaluation))
        }
        Err(e) => {
            if matches!(e, WorkbenchError::RunFailed { .. }) {
                warn!("{}", e);
                state
                    .activity
                    .emit(ActivitySource::Run, ActivityLevel::Error, e.to_string())
                    .await;
            }
            Err(e)
        }
    }
}

/// GET /api/selection
pub async fn current_selection(State(state): State<SharedState>) -> Json<SelectionResponse> {
    let selection = state.workbench.selection();
    Json(SelectionResponse {
        selection: selection.state(),
        view: selection.current().map(|v| (*v).clone()),
        applied: true,
    })
}

/// POST /api/selection/{id}
pub async fn select_evaluation(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> WorkbenchResult<Json<SelectionResponse>> {
    let selection = state.workbench.selection();
    let applied = match selection.select(&id).await? {
        SelectOutcome::Applied(_) => true,
        SelectOutcome::Superseded => false,
    };
    Ok(Json(SelectionResponse {
        selection: selection.state(),
        view: selection.current().map(|v| (*v).clone()),
        applied,
    }))
}
