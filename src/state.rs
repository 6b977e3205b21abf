use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::activity::{ActivityLevel, ActivityLog, ActivitySource};
use crate::config::{BackendConfig, WorkbenchConfig, HTTP_CLIENT_POOL_IDLE_PER_HOST};
use crate::datasets::DatasetClient;
use crate::settings::{load_settings, settings_path, PersistentSettings};
use crate::workbench::catalog::CatalogStore;
use crate::workbench::fixture::FixtureSource;
use crate::workbench::http::HttpSource;
use crate::workbench::repository::EvaluationRepository;
use crate::workbench::session::{Workbench, WorkbenchOptions};
use crate::workbench::source::DataSource;

pub type SharedState = Arc<WorkbenchState>;

pub struct WorkbenchState {
    pub config: WorkbenchConfig,
    pub workbench: Workbench,
    pub datasets: DatasetClient,
    pub settings: RwLock<PersistentSettings>,
    pub settings_path: PathBuf,
    pub activity: ActivityLog,
}

impl WorkbenchState {
    /// Build the HTTP client shared by the REST backend and the datasets client.
    pub fn http_client() -> anyhow::Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .pool_max_idle_per_host(HTTP_CLIENT_POOL_IDLE_PER_HOST)
            .build()?)
    }

    pub fn backend(config: &WorkbenchConfig, client: &reqwest::Client) -> Arc<dyn DataSource> {
        match &config.backend {
            BackendConfig::Fixture {
                path,
                run_delay,
                compare_delay,
            } => Arc::new(FixtureSource::new(path.clone(), *run_delay, *compare_delay)),
            BackendConfig::Http { base } => Arc::new(HttpSource::new(client.clone(), base.clone())),
        }
    }

    /// Load catalogs and evaluations, falling back to empty collections when
    /// the source cannot be read, then select the first evaluation.
    pub async fn open(
        config: WorkbenchConfig,
        source: Arc<dyn DataSource>,
        client: reqwest::Client,
    ) -> Self {
        let timeout = config.fetch_timeout;
        let activity = ActivityLog::new();

        let (catalog, repository) = tokio::join!(
            CatalogStore::load(source.as_ref(), timeout),
            EvaluationRepository::load(source.clone(), timeout),
        );

        let catalog = match catalog {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("{}; continuing with empty catalogs", e);
                activity
                    .emit(ActivitySource::Workbench, ActivityLevel::Warn, e.to_string())
                    .await;
                CatalogStore::empty()
            }
        };
        let repository = match repository {
            Ok(repository) => repository,
            Err(e) => {
                warn!("{}; continuing with no evaluations", e);
                activity
                    .emit(ActivitySource::Workbench, ActivityLevel::Warn, e.to_string())
                    .await;
                EvaluationRepository::new(Vec::new(), source.clone(), timeout)
            }
        };
        info!(
            "Workbench loaded: {} projects, {} models, {} evaluations",
            catalog.projects().len(),
            catalog.models().len(),
            repository.len()
        );

        let workbench = Workbench::new(
            Arc::new(catalog),
            Arc::new(repository),
            source,
            WorkbenchOptions {
                fetch_timeout: timeout,
            },
        );

        if let Some(first) = workbench.repository().first_id() {
            if let Err(e) = workbench.selection().select(&first).await {
                warn!("Initial selection of {} failed: {}", first, e);
            }
        }

        let settings_path = settings_path(&config);
        let settings = load_settings(&settings_path);
        let datasets = DatasetClient::new(
            client,
            config.datasets_api.clone(),
            config.fixture_path().cloned(),
        );

        Self {
            config,
            workbench,
            datasets,
            settings: RwLock::new(settings),
            settings_path,
            activity,
        }
    }
}
