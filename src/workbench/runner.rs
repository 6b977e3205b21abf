use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

use super::repository::EvaluationRepository;
use super::source::{with_timeout, DataSource};
use super::{EvalStatus, Evaluation};
use crate::error::{WorkbenchError, WorkbenchResult};

/// Reject empty (or whitespace-only) prompt text before any side effect.
pub(crate) fn validate_run_input(prompt: &str, user_input: &str) -> WorkbenchResult<()> {
    if prompt.trim().is_empty() {
        return Err(WorkbenchError::InvalidInput(
            "system prompt must not be empty".to_string(),
        ));
    }
    if user_input.trim().is_empty() {
        return Err(WorkbenchError::InvalidInput(
            "user input must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Executes single evaluations, at most one in flight per evaluation id.
pub struct RunExecutor {
    repository: Arc<EvaluationRepository>,
    source: Arc<dyn DataSource>,
    timeout: Option<Duration>,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl RunExecutor {
    pub fn new(
        repository: Arc<EvaluationRepository>,
        source: Arc<dyn DataSource>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            repository,
            source,
            timeout,
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn is_running(&self, eval_id: &str) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(eval_id)
    }

    pub async fn run(
        &self,
        eval_id: &str,
        prompt: &str,
        user_input: &str,
    ) -> WorkbenchResult<Evaluation> {
        validate_run_input(prompt, user_input)?;
        self.repository.get(eval_id)?;

        let _slot = PendingSlot::acquire(&self.pending, eval_id)?;
        let marker = RunningMarker::set(&self.repository, eval_id)?;
        debug!("Submitting run for {}", eval_id);

        let outcome = with_timeout(
            self.timeout,
            self.source.submit_run(eval_id, prompt, user_input),
        )
        .await
        .map_err(|e| WorkbenchError::run_failed(eval_id, e))?;

        if !outcome.status.is_terminal() {
            return Err(WorkbenchError::run_failed(
                eval_id,
                format!("backend reported non-terminal status '{}'", outcome.status),
            ));
        }

        let updated = self.repository.apply_run_result(
            eval_id,
            outcome.output,
            outcome.status,
            outcome.duration_ms,
        )?;
        marker.commit();
        Ok(updated)
    }
}

/// Membership in the pending set for the lifetime of one run.
struct PendingSlot {
    pending: Arc<Mutex<HashSet<String>>>,
    id: String,
}

impl PendingSlot {
    fn acquire(pending: &Arc<Mutex<HashSet<String>>>, id: &str) -> WorkbenchResult<Self> {
        let mut set = pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(id.to_string()) {
            return Err(WorkbenchError::AlreadyRunning(id.to_string()));
        }
        Ok(Self {
            pending: pending.clone(),
            id: id.to_string(),
        })
    }
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Holds an evaluation at `running`; restores the prior status on drop
/// unless the run result was committed.
struct RunningMarker<'a> {
    repository: &'a EvaluationRepository,
    id: String,
    previous: EvalStatus,
    committed: bool,
}

impl<'a> RunningMarker<'a> {
    fn set(repository: &'a EvaluationRepository, id: &str) -> WorkbenchResult<Self> {
        let previous = repository.mark_running(id)?;
        Ok(Self {
            repository,
            id: id.to_string(),
            previous,
            committed: false,
        })
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for RunningMarker<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let _ = self.repository.restore_status(&self.id, self.previous);
        }
    }
}
