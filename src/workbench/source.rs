//! Data-access seam for the workbench.
//!
//! Every backend (static fixture, REST endpoint, in-memory fake) answers the
//! same contract: identical inputs, return shapes and nullability. Absence of
//! data is a valid empty result; only transport or decoding problems are errors.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use super::{Catalogs, Evaluation, Filter, JudgeScore, Model, ModelRunReport, RunOutcome, TestResult};

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Malformed(err.to_string())
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Malformed(err.to_string())
        } else {
            SourceError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_catalogs(&self) -> SourceResult<Catalogs>;

    async fn fetch_evaluations(&self, filter: &Filter) -> SourceResult<Vec<Evaluation>>;

    /// Empty when the evaluation has no recorded tests.
    async fn fetch_test_results(&self, eval_id: &str) -> SourceResult<Vec<TestResult>>;

    /// Empty string when no logs were captured.
    async fn fetch_logs(&self, eval_id: &str) -> SourceResult<String>;

    async fn fetch_judge_score(&self, eval_id: &str) -> SourceResult<Option<JudgeScore>>;

    async fn submit_run(
        &self,
        eval_id: &str,
        prompt: &str,
        user_input: &str,
    ) -> SourceResult<RunOutcome>;

    /// Execute the prompt against one model as part of a comparison batch.
    async fn submit_model_run(
        &self,
        model: &Model,
        prompt: &str,
        user_input: &str,
    ) -> SourceResult<ModelRunReport>;
}

/// Await `fut`, bounded by `timeout` when one is configured.
///
/// On expiry the inner future is dropped, which cancels whatever it had in flight.
pub async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> SourceResult<T>
where
    F: Future<Output = SourceResult<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| SourceError::Timeout(limit))?,
        None => fut.await,
    }
}
