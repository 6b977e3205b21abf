use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::source::{with_timeout, DataSource};
use super::{Catalogs, Model, Project};
use crate::config::RECENT_PROJECTS_LIMIT;
use crate::error::{WorkbenchError, WorkbenchResult};

pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// Projects and models for the session. Read-only once loaded.
#[derive(Debug, Default)]
pub struct CatalogStore {
    projects: Vec<Project>,
    models: Vec<Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub evaluation_count: usize,
}

impl CatalogStore {
    pub fn new(catalogs: Catalogs) -> Self {
        Self {
            projects: catalogs.projects,
            models: catalogs.models,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetch both catalogs once. Callers that cannot reach the source should
    /// fall back to [`CatalogStore::empty`].
    pub async fn load(
        source: &dyn DataSource,
        timeout: Option<Duration>,
    ) -> WorkbenchResult<Self> {
        let catalogs = with_timeout(timeout, source.fetch_catalogs())
            .await
            .map_err(|source| WorkbenchError::SourceUnavailable {
                operation: "load catalogs",
                source,
            })?;
        debug!(
            "Loaded {} projects and {} models",
            catalogs.projects.len(),
            catalogs.models.len()
        );
        Ok(Self::new(catalogs))
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn model(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Display name for a project id. Never fails.
    pub fn project_name(&self, id: &str) -> &str {
        self.project(id)
            .map(|p| p.name.as_str())
            .unwrap_or(UNKNOWN_PROJECT)
    }

    /// Display name for a model id, falling back to the id itself.
    pub fn model_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.model(id).map(|m| m.name.as_str()).unwrap_or(id)
    }

    /// The first `limit` projects in storage order (sidebar "recent projects").
    pub fn recent_projects(&self, limit: Option<usize>) -> &[Project] {
        let limit = limit.unwrap_or(RECENT_PROJECTS_LIMIT);
        &self.projects[..limit.min(self.projects.len())]
    }

    pub fn project_summary(&self, id: &str, evaluation_count: usize) -> Option<ProjectSummary> {
        self.project(id).map(|project| ProjectSummary {
            project: project.clone(),
            evaluation_count,
        })
    }
}
