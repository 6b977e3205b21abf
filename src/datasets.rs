//! Dataset catalog and import client.
//!
//! The datasets backend lives elsewhere; this module only speaks its request
//! and response contract. Listing degrades to the fixture's datasets and then to
//! a built-in demo list, mirroring how the dashboard behaves offline.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

use crate::error::{WorkbenchError, WorkbenchResult};
use crate::workbench::fixture::FixtureDocument;
use crate::workbench::http::endpoint_url;
use crate::workbench::source::SourceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub row_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetOrigin {
    Api,
    Fixture,
    Demo,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetListing {
    pub datasets: Vec<Dataset>,
    pub origin: DatasetOrigin,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlImport {
    pub url: String,
    #[serde(default)]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubImport {
    pub url: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

pub struct DatasetClient {
    client: reqwest::Client,
    base: Url,
    fixture: Option<PathBuf>,
}

impl DatasetClient {
    pub fn new(client: reqwest::Client, base: Url, fixture: Option<PathBuf>) -> Self {
        Self {
            client,
            base,
            fixture,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        endpoint_url(&self.base, segments)
    }

    pub async fn list(&self) -> DatasetListing {
        let api_err = match self.fetch_from_api().await {
            Ok(datasets) => {
                return DatasetListing {
                    datasets,
                    origin: DatasetOrigin::Api,
                }
            }
            Err(e) => e,
        };
        warn!("Datasets API not available, trying fixture: {}", api_err);

        if let Some(path) = &self.fixture {
            match FixtureDocument::read(path).await {
                Ok(FixtureDocument {
                    datasets: Some(datasets),
                    ..
                }) => {
                    return DatasetListing {
                        datasets,
                        origin: DatasetOrigin::Fixture,
                    }
                }
                Ok(_) => warn!("Fixture {:?} has no datasets", path),
                Err(e) => warn!("Failed to read datasets from fixture {:?}: {}", path, e),
            }
        }

        DatasetListing {
            datasets: demo_datasets(),
            origin: DatasetOrigin::Demo,
        }
    }

    async fn fetch_from_api(&self) -> Result<Vec<Dataset>, SourceError> {
        let resp = self.client.get(self.endpoint(&["datasets"])?).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::Transport(format!(
                "API returned {}",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }

    pub async fn import_from_url(&self, request: &UrlImport) -> WorkbenchResult<()> {
        require("url", &request.url)?;
        self.post_json("import dataset from url", &["datasets", "url"], request)
            .await
    }

    pub async fn import_from_github(&self, request: &GithubImport) -> WorkbenchResult<()> {
        require("url", &request.url)?;
        self.post_json("import dataset from github", &["datasets", "github"], request)
            .await
    }

    /// Forward an uploaded file to the datasets API. `name` defaults to the
    /// stem of `file_name`.
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        name: Option<&str>,
        description: Option<&str>,
    ) -> WorkbenchResult<()> {
        const OPERATION: &str = "upload dataset";
        require("file", file_name)?;
        if bytes.is_empty() {
            return Err(WorkbenchError::InvalidInput("file is empty".to_string()));
        }

        let name = name
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_dataset_name(file_name));

        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(bytes).file_name(file_name.to_string()),
            )
            .text("name", name)
            .text("description", description.unwrap_or_default().to_string());

        let resp = self
            .client
            .post(
                self.endpoint(&["datasets", "upload"])
                    .map_err(|e| unavailable(OPERATION, e))?,
            )
            .multipart(form)
            .send()
            .await
            .map_err(|e| unavailable(OPERATION, e.into()))?;
        check_status(OPERATION, resp.status())?;
        info!("Uploaded dataset {}", file_name);
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> WorkbenchResult<()> {
        require("id", id)?;
        const OPERATION: &str = "delete dataset";
        let resp = self
            .client
            .delete(self.endpoint(&["datasets", id]).map_err(|e| unavailable(OPERATION, e))?)
            .send()
            .await
            .map_err(|e| unavailable(OPERATION, e.into()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(WorkbenchError::not_found("Dataset", id));
        }
        check_status(OPERATION, resp.status())
    }

    async fn post_json<T: Serialize>(
        &self,
        operation: &'static str,
        segments: &[&str],
        body: &T,
    ) -> WorkbenchResult<()> {
        let resp = self
            .client
            .post(self.endpoint(segments).map_err(|e| unavailable(operation, e))?)
            .json(body)
            .send()
            .await
            .map_err(|e| unavailable(operation, e.into()))?;
        check_status(operation, resp.status())?;
        info!("{} succeeded", operation);
        Ok(())
    }
}

fn require(field: &str, value: &str) -> WorkbenchResult<()> {
    if value.trim().is_empty() {
        return Err(WorkbenchError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

fn unavailable(operation: &'static str, source: SourceError) -> WorkbenchError {
    WorkbenchError::SourceUnavailable { operation, source }
}

fn check_status(operation: &'static str, status: reqwest::StatusCode) -> WorkbenchResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(unavailable(
            operation,
            SourceError::Transport(format!("datasets API returned {}", status)),
        ))
    }
}

/// `reviews.v2.csv` -> `reviews.v2`
pub fn default_dataset_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}

pub fn demo_datasets() -> Vec<Dataset> {
    let at = |y, m, d, h, min| {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .unwrap_or_default()
    };
    let ds = |id: &str, name: &str, description: &str, row_count, created_at| Dataset {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
        row_count,
        created_at,
    };
    vec![
        ds(
            "ds-001",
            "Customer Support Q&A v1",
            "Collection of 500 customer support conversations",
            500,
            at(2024, 1, 15, 10, 30),
        ),
        ds(
            "ds-002",
            "Code Generation Test Cases",
            "Programming problems and expected solutions",
            250,
            at(2024, 1, 20, 14, 22),
        ),
        ds(
            "ds-003",
            "Medical FAQs",
            "Common medical questions and answers",
            1200,
            at(2024, 2, 1, 9, 15),
        ),
        ds(
            "ds-004",
            "Sentiment Analysis Training Set",
            "Product reviews with sentiment labels",
            5000,
            at(2024, 2, 10, 13, 0),
        ),
        ds(
            "ds-005",
            "Legal Document Summaries",
            "Legal contracts and their summaries",
            150,
            at(2024, 2, 12, 10, 30),
        ),
    ]
}
