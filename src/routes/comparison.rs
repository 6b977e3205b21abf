use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use crate::activity::{ActivityLevel, ActivitySource};
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::state::SharedState;
use crate::workbench::comparison::{export_report, ExportFormat};
use crate::workbench::ComparisonReport;

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, alias = "input")]
    pub user_input: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// POST /api/comparisons
pub async fn run_comparison(
    State(state): State<SharedState>,
    Json(body): Json<CompareRequest>,
) -> WorkbenchResult<Json<ComparisonReport>> {
    match state
        .workbench
        .compare(&body.models, &body.prompt, &body.user_input)
        .await
    {
        Ok(report) => {
            let summary = match &report.winner {
                Some(winner) => format!(
                    "Compared {} models, winner {}",
                    report.results.len(),
                    winner
                ),
                None => format!("Compared {} models, no winner", report.results.len()),
            };
            info!("{}", summary);
            state
                .activity
                .emit(ActivitySource::Comparison, ActivityLevel::Info, summary)
                .await;
            Ok(Json(report.as_ref().clone()))
        }
        Err(e) => {
            if matches!(e, WorkbenchError::RunFailed { .. }) {
                warn!("{}", e);
                state
                    .activity
                    .emit(ActivitySource::Comparison, ActivityLevel::Error, e.to_string())
                    .await;
            }
            Err(e)
        }
    }
}

/// GET /api/comparisons/latest
pub async fn latest_comparison(
    State(state): State<SharedState>,
) -> WorkbenchResult<Json<ComparisonReport>> {
    state
        .workbench
        .last_comparison()
        .map(|report| Json(report.as_ref().clone()))
        .ok_or_else(|| WorkbenchError::not_found("Comparison", "latest"))
}

/// GET /api/comparisons/latest/export?format=json|csv
pub async fn export_latest(
    State(state): State<SharedState>,
    Query(query): Query<ExportQuery>,
) -> WorkbenchResult<impl IntoResponse> {
    let requested = query.format.as_deref().unwrap_or("json");
    let format = ExportFormat::parse(requested).ok_or_else(|| {
        WorkbenchError::InvalidInput(format!("unsupported export format '{}'", requested))
    })?;
    let report = state
        .workbench
        .last_comparison()
        .ok_or_else(|| WorkbenchError::not_found("Comparison", "latest"))?;
    let body = export_report(&report, format)?;
    Ok(([(header::CONTENT_TYPE, format.content_type())], body))
}
