use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::catalog::CatalogStore;
use super::repository::EvaluationRepository;
use super::view::EvaluationView;
use super::Evaluation;
use crate::error::WorkbenchResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum SelectionState {
    NoSelection,
    Selecting(String),
    Selected(String),
}

/// Result of a [`SelectionController::select`] call that did not fail.
#[derive(Debug, Clone)]
pub enum SelectOutcome {
    Applied(Arc<EvaluationView>),
    /// A newer selection was issued while this one was fetching; its
    /// results were discarded.
    Superseded,
}

struct Visible {
    state: SelectionState,
    view: Option<Arc<EvaluationView>>,
}

/// Tracks the current evaluation and composes its view-model.
///
/// Selections race freely; each call takes a ticket from a monotonically
/// increasing counter and only the holder of the latest ticket may publish.
pub struct SelectionController {
    repository: Arc<EvaluationRepository>,
    catalog: Arc<CatalogStore>,
    latest: AtomicU64,
    visible: Mutex<Visible>,
}

impl SelectionController {
    pub fn new(repository: Arc<EvaluationRepository>, catalog: Arc<CatalogStore>) -> Self {
        Self {
            repository,
            catalog,
            latest: AtomicU64::new(0),
            visible: Mutex::new(Visible {
                state: SelectionState::NoSelection,
                view: None,
            }),
        }
    }

    fn visible(&self) -> MutexGuard<'_, Visible> {
        self.visible.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SelectionState {
        self.visible().state.clone()
    }

    pub fn current(&self) -> Option<Arc<EvaluationView>> {
        self.visible().view.clone()
    }

    pub async fn select(&self, id: &str) -> WorkbenchResult<SelectOutcome> {
        // Unknown ids fail before anything becomes visible.
        self.repository.get(id)?;

        let ticket = {
            let mut visible = self.visible();
            let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            visible.state = SelectionState::Selecting(id.to_string());
            ticket
        };
        debug!("Selecting evaluation {} (ticket {})", id, ticket);

        let fetched = tokio::try_join!(
            self.repository.test_results(id),
            self.repository.logs(id),
            self.repository.judge_score(id),
        );

        let mut visible = self.visible();
        if self.latest.load(Ordering::SeqCst) != ticket {
            debug!("Discarding stale selection of {} (ticket {})", id, ticket);
            return Ok(SelectOutcome::Superseded);
        }

        let composed = fetched.and_then(|(test_results, logs, judge_score)| {
            let evaluation = self.repository.get(id)?;
            Ok(self.compose(evaluation, test_results, logs, judge_score))
        });

        match composed {
            Ok(view) => {
                let view = Arc::new(view);
                visible.state = SelectionState::Selected(id.to_string());
                visible.view = Some(view.clone());
                Ok(SelectOutcome::Applied(view))
            }
            Err(e) => {
                visible.state = match &visible.view {
                    Some(prev) => SelectionState::Selected(prev.evaluation.id.clone()),
                    None => SelectionState::NoSelection,
                };
                Err(e)
            }
        }
    }

    /// Swap in a fresher copy of the selected evaluation (after a run).
    /// No-op when `evaluation` is not the one on display.
    pub fn refresh_evaluation(&self, evaluation: &Evaluation) {
        let mut visible = self.visible();
        if let Some(view) = visible.view.as_mut() {
            if view.evaluation.id == evaluation.id {
                Arc::make_mut(view).set_evaluation(evaluation.clone());
            }
        }
    }

    /// Drop the current selection. Outstanding fetches become stale.
    pub fn clear(&self) {
        let mut visible = self.visible();
        self.latest.fetch_add(1, Ordering::SeqCst);
        visible.state = SelectionState::NoSelection;
        visible.view = None;
    }

    fn compose(
        &self,
        evaluation: Evaluation,
        test_results: Vec<super::TestResult>,
        logs: String,
        judge_score: Option<super::JudgeScore>,
    ) -> EvaluationView {
        let project_name = self.catalog.project_name(&evaluation.project_id).to_string();
        EvaluationView::new(evaluation, project_name, test_results, logs, judge_score)
    }
}
