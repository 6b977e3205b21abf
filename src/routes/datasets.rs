use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;

use crate::activity::{ActivityLevel, ActivitySource};
use crate::datasets::{DatasetListing, GithubImport, UrlImport};
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
}

/// GET /api/datasets: never fails; falls back to fixture then demo data.
pub async fn list_datasets(State(state): State<SharedState>) -> Json<DatasetListing> {
    Json(state.datasets.list().await)
}

/// POST /api/datasets/url
pub async fn import_url(
    State(state): State<SharedState>,
    Json(body): Json<UrlImport>,
) -> WorkbenchResult<Json<ImportResponse>> {
    state.datasets.import_from_url(&body).await?;
    acknowledge(&state, format!("Imported dataset from {}", body.url)).await
}

/// POST /api/datasets/github
pub async fn import_github(
    State(state): State<SharedState>,
    Json(body): Json<GithubImport>,
) -> WorkbenchResult<Json<ImportResponse>> {
    state.datasets.import_from_github(&body).await?;
    acknowledge(&state, format!("Imported dataset from GitHub {}", body.url)).await
}

/// POST /api/datasets/upload: multipart form with a `file` part and
/// optional `name` and `description` text parts.
pub async fn upload_dataset(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> WorkbenchResult<Json<ImportResponse>> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut name = None;
    let mut description = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("dataset").to_string();
                let bytes = field.bytes().await.map_err(malformed)?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("name") => name = Some(field.text().await.map_err(malformed)?),
            Some("description") => description = Some(field.text().await.map_err(malformed)?),
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| WorkbenchError::InvalidInput("file is required".to_string()))?;
    state
        .datasets
        .upload(&file_name, bytes, name.as_deref(), description.as_deref())
        .await?;
    acknowledge(&state, format!("Uploaded dataset {}", file_name)).await
}

fn malformed(err: MultipartError) -> WorkbenchError {
    WorkbenchError::InvalidInput(format!("malformed upload: {}", err.body_text()))
}

/// DELETE /api/datasets/{id}
pub async fn delete_dataset(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> WorkbenchResult<Json<ImportResponse>> {
    state.datasets.delete(&id).await?;
    acknowledge(&state, format!("Deleted dataset {}", id)).await
}

async fn acknowledge(state: &SharedState, message: String) -> WorkbenchResult<Json<ImportResponse>> {
    state
        .activity
        .emit(ActivitySource::Datasets, ActivityLevel::Info, message)
        .await;
    Ok(Json(ImportResponse { success: true }))
}
