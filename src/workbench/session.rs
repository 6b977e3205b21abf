use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::catalog::CatalogStore;
use super::comparison::ComparisonExecutor;
use super::repository::EvaluationRepository;
use super::runner::RunExecutor;
use super::selection::SelectionController;
use super::source::DataSource;
use super::{ComparisonReport, Evaluation};
use crate::error::WorkbenchResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbenchOptions {
    /// Applied to every external fetch. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
}

/// One evaluation session: catalogs, evaluations, the current selection and
/// the executors that mutate them.
pub struct Workbench {
    catalog: Arc<CatalogStore>,
    repository: Arc<EvaluationRepository>,
    selection: SelectionController,
    runner: RunExecutor,
    comparison: ComparisonExecutor,
    last_comparison: Mutex<Option<Arc<ComparisonReport>>>,
}

impl Workbench {
    pub fn new(
        catalog: Arc<CatalogStore>,
        repository: Arc<EvaluationRepository>,
        source: Arc<dyn DataSource>,
        options: WorkbenchOptions,
    ) -> Self {
        Self {
            selection: SelectionController::new(repository.clone(), catalog.clone()),
            runner: RunExecutor::new(repository.clone(), source.clone(), options.fetch_timeout),
            comparison: ComparisonExecutor::new(catalog.clone(), source, options.fetch_timeout),
            catalog,
            repository,
            last_comparison: Mutex::new(None),
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn repository(&self) -> &EvaluationRepository {
        &self.repository
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn runner(&self) -> &RunExecutor {
        &self.runner
    }

    /// Run an evaluation and keep the detail view in sync when it is the
    /// one currently selected.
    pub async fn run(
        &self,
        eval_id: &str,
        prompt: &str,
        user_input: &str,
    ) -> WorkbenchResult<Evaluation> {
        let updated = self.runner.run(eval_id, prompt, user_input).await?;
        self.selection.refresh_evaluation(&updated);
        Ok(updated)
    }

    pub async fn compare(
        &self,
        model_ids: &[String],
        prompt: &str,
        user_input: &str,
    ) -> WorkbenchResult<Arc<ComparisonReport>> {
        let report = Arc::new(self.comparison.compare(model_ids, prompt, user_input).await?);
        *self
            .last_comparison
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        Ok(report)
    }

    pub fn last_comparison(&self) -> Option<Arc<ComparisonReport>> {
        self.last_comparison
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
