use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::debug;

use super::source::{with_timeout, DataSource};
use super::{EvalStatus, Evaluation, Filter, JudgeScore, TestResult};
use crate::error::{WorkbenchError, WorkbenchResult};

struct Store {
    evaluations: Vec<Evaluation>,
    /// Ids held at `running` by an executing run.
    in_flight: HashSet<String>,
}

impl Store {
    fn find_mut(&mut self, id: &str) -> WorkbenchResult<&mut Evaluation> {
        self.evaluations
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| WorkbenchError::not_found("Evaluation", id))
    }
}

/// Owner of evaluation state. The only writer of [`Evaluation`] records;
/// artifacts (tests, logs, judge scores) are read through from the source.
pub struct EvaluationRepository {
    store: RwLock<Store>,
    source: Arc<dyn DataSource>,
    timeout: Option<Duration>,
}

impl EvaluationRepository {
    pub fn new(
        evaluations: Vec<Evaluation>,
        source: Arc<dyn DataSource>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            store: RwLock::new(Store {
                evaluations,
                in_flight: HashSet::new(),
            }),
            source,
            timeout,
        }
    }

    pub async fn load(
        source: Arc<dyn DataSource>,
        timeout: Option<Duration>,
    ) -> WorkbenchResult<Self> {
        let evaluations = Self::fetch_all(source.as_ref(), timeout).await?;
        debug!("Loaded {} evaluations", evaluations.len());
        Ok(Self::new(evaluations, source, timeout))
    }

    async fn fetch_all(
        source: &dyn DataSource,
        timeout: Option<Duration>,
    ) -> WorkbenchResult<Vec<Evaluation>> {
        with_timeout(timeout, source.fetch_evaluations(&Filter::default()))
            .await
            .map_err(|source| WorkbenchError::SourceUnavailable {
                operation: "load evaluations",
                source,
            })
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace storage with a fresh copy from the source. On failure the
    /// current contents are kept. Evaluations with a run in flight stay
    /// `running` whatever the source reports.
    pub async fn refresh(&self) -> WorkbenchResult<usize> {
        let mut fresh = Self::fetch_all(self.source.as_ref(), self.timeout).await?;
        let count = fresh.len();
        let mut store = self.write();
        for evaluation in fresh.iter_mut() {
            if store.in_flight.contains(&evaluation.id) {
                evaluation.status = EvalStatus::Running;
            }
        }
        store.evaluations = fresh;
        Ok(count)
    }

    /// Evaluations matching every present filter field, in storage order.
    pub fn list(&self, filter: &Filter) -> Vec<Evaluation> {
        self.read()
            .evaluations
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Evaluation> {
        self.read().evaluations.clone()
    }

    pub fn len(&self) -> usize {
        self.read().evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().evaluations.is_empty()
    }

    pub fn get(&self, id: &str) -> WorkbenchResult<Evaluation> {
        self.read()
            .evaluations
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| WorkbenchError::not_found("Evaluation", id))
    }

    pub fn first_id(&self) -> Option<String> {
        self.read().evaluations.first().map(|e| e.id.clone())
    }

    pub fn count_for_project(&self, project_id: &str) -> usize {
        self.read()
            .evaluations
            .iter()
            .filter(|e| e.project_id == project_id)
            .count()
    }

    pub async fn test_results(&self, id: &str) -> WorkbenchResult<Vec<TestResult>> {
        with_timeout(self.timeout, self.source.fetch_test_results(id))
            .await
            .map_err(|source| WorkbenchError::ArtifactUnavailable {
                artifact: "test results",
                eval_id: id.to_string(),
                source,
            })
    }

    pub async fn logs(&self, id: &str) -> WorkbenchResult<String> {
        with_timeout(self.timeout, self.source.fetch_logs(id))
            .await
            .map_err(|source| WorkbenchError::ArtifactUnavailable {
                artifact: "logs",
                eval_id: id.to_string(),
                source,
            })
    }

    pub async fn judge_score(&self, id: &str) -> WorkbenchResult<Option<JudgeScore>> {
        with_timeout(self.timeout, self.source.fetch_judge_score(id))
            .await
            .map_err(|source| WorkbenchError::ArtifactUnavailable {
                artifact: "judge score",
                eval_id: id.to_string(),
                source,
            })
    }

    /// Record a completed run. Only `status`, `output` and `duration_ms` change.
    pub fn apply_run_result(
        &self,
        id: &str,
        output: impl Into<String>,
        status: EvalStatus,
        duration_ms: u64,
    ) -> WorkbenchResult<Evaluation> {
        let mut store = self.write();
        let evaluation = store.find_mut(id)?;
        evaluation.output = Some(output.into());
        evaluation.status = status;
        evaluation.duration_ms = Some(duration_ms);
        let updated = evaluation.clone();
        store.in_flight.remove(id);
        Ok(updated)
    }

    /// Flag an evaluation as running, returning the status it had before.
    /// It stays `running` across refreshes until [`Self::apply_run_result`]
    /// or [`Self::restore_status`].
    pub(crate) fn mark_running(&self, id: &str) -> WorkbenchResult<EvalStatus> {
        let mut store = self.write();
        let previous = std::mem::replace(&mut store.find_mut(id)?.status, EvalStatus::Running);
        store.in_flight.insert(id.to_string());
        Ok(previous)
    }

    /// End a run without a result, putting back `status`.
    pub(crate) fn restore_status(&self, id: &str, status: EvalStatus) -> WorkbenchResult<()> {
        let mut store = self.write();
        store.in_flight.remove(id);
        store.find_mut(id)?.status = status;
        Ok(())
    }
}
