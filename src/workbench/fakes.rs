//! In-memory data source for tests.
//!
//! `MemorySource` answers the [`DataSource`] contract from plain collections.
//! Artifact fetches, runs and model runs can be delayed per id and made to
//! fail per operation, so ordering and failure paths can be driven
//! deterministically under a paused tokio clock.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::source::{DataSource, SourceError, SourceResult};
use super::{
    Catalogs, EvalStatus, Evaluation, Filter, JudgeScore, Model, ModelRunReport, RunOutcome,
    TestResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Catalogs,
    Evaluations,
    TestResults,
    Logs,
    JudgeScore,
    Run,
    ModelRun,
}

#[derive(Default)]
pub struct MemorySource {
    catalogs: Catalogs,
    evaluations: Vec<Evaluation>,
    test_results: HashMap<String, Vec<TestResult>>,
    logs: HashMap<String, String>,
    judge_scores: HashMap<String, JudgeScore>,
    model_scores: HashMap<String, f64>,
    artifact_delays: HashMap<String, Duration>,
    model_delays: HashMap<String, Duration>,
    run_delay: Duration,
    failing: Mutex<HashSet<Operation>>,
    failing_models: HashSet<String>,
    run_calls: AtomicUsize,
    model_run_calls: AtomicUsize,
    model_run_completions: AtomicUsize,
    artifact_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(catalogs: Catalogs, evaluations: Vec<Evaluation>) -> Self {
        Self {
            catalogs,
            evaluations,
            ..Default::default()
        }
    }

    pub fn with_test_results(mut self, eval_id: &str, results: Vec<TestResult>) -> Self {
        self.test_results.insert(eval_id.to_string(), results);
        self
    }

    pub fn with_logs(mut self, eval_id: &str, logs: &str) -> Self {
        self.logs.insert(eval_id.to_string(), logs.to_string());
        self
    }

    pub fn with_judge_score(mut self, eval_id: &str, score: JudgeScore) -> Self {
        self.judge_scores.insert(eval_id.to_string(), score);
        self
    }

    /// Delay every artifact fetch for `eval_id`.
    pub fn with_artifact_delay(mut self, eval_id: &str, delay: Duration) -> Self {
        self.artifact_delays.insert(eval_id.to_string(), delay);
        self
    }

    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = delay;
        self
    }

    pub fn with_model_score(mut self, model_id: &str, overall: f64) -> Self {
        self.model_scores.insert(model_id.to_string(), overall);
        self
    }

    pub fn with_model_delay(mut self, model_id: &str, delay: Duration) -> Self {
        self.model_delays.insert(model_id.to_string(), delay);
        self
    }

    pub fn with_failing_model(mut self, model_id: &str) -> Self {
        self.failing_models.insert(model_id.to_string());
        self
    }

    pub fn fail(&self, op: Operation) {
        self.failing.lock().unwrap_or_else(PoisonError::into_inner).insert(op);
    }

    pub fn recover(&self, op: Operation) {
        self.failing.lock().unwrap_or_else(PoisonError::into_inner).remove(&op);
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn model_run_calls(&self) -> usize {
        self.model_run_calls.load(Ordering::SeqCst)
    }

    /// Model runs that got past their delay. Cancelled runs never count.
    pub fn model_run_completions(&self) -> usize {
        self.model_run_completions.load(Ordering::SeqCst)
    }

    pub fn artifact_calls(&self) -> usize {
        self.artifact_calls.load(Ordering::SeqCst)
    }

    fn check(&self, op: Operation) -> SourceResult<()> {
        if self.failing.lock().unwrap_or_else(PoisonError::into_inner).contains(&op) {
            return Err(SourceError::Transport(format!("{:?} unavailable", op)));
        }
        Ok(())
    }

    async fn artifact_gate(&self, eval_id: &str, op: Operation) -> SourceResult<()> {
        self.artifact_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.artifact_delays.get(eval_id) {
            tokio::time::sleep(*delay).await;
        }
        self.check(op)
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_catalogs(&self) -> SourceResult<Catalogs> {
        self.check(Operation::Catalogs)?;
        Ok(self.catalogs.clone())
    }

    async fn fetch_evaluations(&self, filter: &Filter) -> SourceResult<Vec<Evaluation>> {
        self.check(Operation::Evaluations)?;
        Ok(self
            .evaluations
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn fetch_test_results(&self, eval_id: &str) -> SourceResult<Vec<TestResult>> {
        self.artifact_gate(eval_id, Operation::TestResults).await?;
        Ok(self.test_results.get(eval_id).cloned().unwrap_or_default())
    }

    async fn fetch_logs(&self, eval_id: &str) -> SourceResult<String> {
        self.artifact_gate(eval_id, Operation::Logs).await?;
        Ok(self.logs.get(eval_id).cloned().unwrap_or_default())
    }

    async fn fetch_judge_score(&self, eval_id: &str) -> SourceResult<Option<JudgeScore>> {
        self.artifact_gate(eval_id, Operation::JudgeScore).await?;
        Ok(self.judge_scores.get(eval_id).cloned())
    }

    async fn submit_run(
        &self,
        eval_id: &str,
        prompt: &str,
        user_input: &str,
    ) -> SourceResult<RunOutcome> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.run_delay).await;
        self.check(Operation::Run)?;
        Ok(RunOutcome {
            output: format!("{} :: {} :: {}", eval_id, prompt, user_input),
            status: EvalStatus::Passed,
            duration_ms: self.run_delay.as_millis() as u64,
        })
    }

    async fn submit_model_run(
        &self,
        model: &Model,
        prompt: &str,
        user_input: &str,
    ) -> SourceResult<ModelRunReport> {
        self.model_run_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.model_delays.get(&model.id) {
            tokio::time::sleep(*delay).await;
        }
        self.model_run_completions.fetch_add(1, Ordering::SeqCst);
        self.check(Operation::ModelRun)?;
        if self.failing_models.contains(&model.id) {
            return Err(SourceError::Transport(format!("{} rejected the request", model.id)));
        }
        let overall = self.model_scores.get(&model.id).copied().unwrap_or(8.0);
        Ok(ModelRunReport {
            output: format!("{}: {} / {}", model.name, prompt, user_input),
            overall_score: overall,
            accuracy: overall,
            helpfulness: overall,
            latency_ms: 1000.0,
            cost: model.cost_per_1k_tokens,
            pass_rate: 90,
        })
    }
}
