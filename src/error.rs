use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::workbench::source::SourceError;

pub type WorkbenchResult<T> = Result<T, WorkbenchError>;

#[derive(Debug, thiserror::Error)]
pub enum WorkbenchError {
    /// Catalog or evaluation source unreachable or malformed.
    #[error("Source unavailable during {operation}: {source}")]
    SourceUnavailable {
        operation: &'static str,
        #[source]
        source: SourceError,
    },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Transport failure fetching an artifact. Absence of data is not an error.
    #[error("Failed to fetch {artifact} for evaluation {eval_id}: {source}")]
    ArtifactUnavailable {
        artifact: &'static str,
        eval_id: String,
        #[source]
        source: SourceError,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid model selection: {0}")]
    InvalidSelection(String),

    #[error("Evaluation {0} is already running")]
    AlreadyRunning(String),

    #[error("Run failed for {target}: {reason}")]
    RunFailed { target: String, reason: String },
}

impl WorkbenchError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        WorkbenchError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn run_failed(target: impl Into<String>, reason: impl ToString) -> Self {
        WorkbenchError::RunFailed {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkbenchError::SourceUnavailable { .. } => "source_unavailable",
            WorkbenchError::NotFound { .. } => "not_found",
            WorkbenchError::ArtifactUnavailable { .. } => "artifact_unavailable",
            WorkbenchError::InvalidInput(_) => "invalid_input",
            WorkbenchError::InvalidSelection(_) => "invalid_selection",
            WorkbenchError::AlreadyRunning(_) => "already_running",
            WorkbenchError::RunFailed { .. } => "run_failed",
        }
    }
}

impl IntoResponse for WorkbenchError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkbenchError::SourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            WorkbenchError::NotFound { .. } => StatusCode::NOT_FOUND,
            WorkbenchError::ArtifactUnavailable { .. } => StatusCode::BAD_GATEWAY,
            WorkbenchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WorkbenchError::InvalidSelection(_) => StatusCode::BAD_REQUEST,
            WorkbenchError::AlreadyRunning(_) => StatusCode::CONFLICT,
            WorkbenchError::RunFailed { .. } => StatusCode::BAD_GATEWAY,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });

        (status, axum::Json(body)).into_response()
    }
}
