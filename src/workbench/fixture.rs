use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::source::{DataSource, SourceError, SourceResult};
use super::{
    Catalogs, EvalStatus, Evaluation, Filter, JudgeScore, Model, ModelRunReport, Project,
    RunOutcome, TestResult,
};
use crate::datasets::Dataset;

/// On-disk layout of the static fixture (`mock-data.json`).
#[derive(Debug, Default, Deserialize)]
pub struct FixtureDocument {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub models: Vec<Model>,
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
    #[serde(default)]
    pub test_results: HashMap<String, Vec<TestResult>>,
    #[serde(default)]
    pub logs: HashMap<String, String>,
    #[serde(default)]
    pub llm_judge_scores: HashMap<String, Option<JudgeScore>>,
    #[serde(default)]
    pub datasets: Option<Vec<Dataset>>,
}

impl FixtureDocument {
    pub async fn read(path: &Path) -> SourceResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            SourceError::Transport(format!("cannot read fixture {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Read-only backend over a static JSON fixture.
///
/// The document is re-read on every fetch, so edits to the file show up on the
/// next refresh. Runs are simulated with fixed delays and never written back.
pub struct FixtureSource {
    path: PathBuf,
    run_delay: Duration,
    compare_delay: Duration,
}

impl FixtureSource {
    pub fn new(path: impl Into<PathBuf>, run_delay: Duration, compare_delay: Duration) -> Self {
        Self {
            path: path.into(),
            run_delay,
            compare_delay,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn document(&self) -> SourceResult<FixtureDocument> {
        FixtureDocument::read(&self.path).await
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    async fn fetch_catalogs(&self) -> SourceResult<Catalogs> {
        let doc = self.document().await?;
        Ok(Catalogs {
            projects: doc.projects,
            models: doc.models,
        })
    }

    async fn fetch_evaluations(&self, filter: &Filter) -> SourceResult<Vec<Evaluation>> {
        let doc = self.document().await?;
        Ok(doc
            .evaluations
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect())
    }

    async fn fetch_test_results(&self, eval_id: &str) -> SourceResult<Vec<TestResult>> {
        let mut doc = self.document().await?;
        Ok(doc.test_results.remove(eval_id).unwrap_or_default())
    }

    async fn fetch_logs(&self, eval_id: &str) -> SourceResult<String> {
        let mut doc = self.document().await?;
        Ok(doc.logs.remove(eval_id).unwrap_or_default())
    }

    async fn fetch_judge_score(&self, eval_id: &str) -> SourceResult<Option<JudgeScore>> {
        let mut doc = self.document().await?;
        Ok(doc.llm_judge_scores.remove(eval_id).flatten())
    }

    async fn submit_run(
        &self,
        eval_id: &str,
        prompt: &str,
        user_input: &str,
    ) -> SourceResult<RunOutcome> {
        debug!("Simulating run for {} ({:?})", eval_id, self.run_delay);
        tokio::time::sleep(self.run_delay).await;
        Ok(RunOutcome {
            output: format!(
                "Mock output for evaluation {}\n\nPrompt: {}\nInput: {}\n\nThis is a simulated response. In production, this would contain the actual LLM output.",
                eval_id, prompt, user_input
            ),
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
        tokio::time::sleep(self.compare_delay).await;
        Ok(mock_model_report(model, prompt, user_input))
    }
}

const CHARS_PER_TOKEN: usize = 4;

/// Stable pseudo-scores for a model: same inputs, same numbers.
pub fn mock_model_report(model: &Model, prompt: &str, user_input: &str) -> ModelRunReport {
    let mut hasher = Sha256::new();
    hasher.update(model.id.as_bytes());
    hasher.update([0u8]);
    hasher.update(prompt.as_bytes());
    hasher.update([0u8]);
    hasher.update(user_input.as_bytes());
    let digest = hasher.finalize();

    // Fraction in [0, 1) from two digest bytes.
    let unit = |i: usize| u16::from_be_bytes([digest[2 * i], digest[2 * i + 1]]) as f64 / 65536.0;

    let output = format!(
        "Sample output from {}:\n\n{}\n\nUser: {}\n\nAssistant: This is a mock response for comparison purposes.",
        model.name, prompt, user_input
    );
    let tokens = (prompt.len() + user_input.len() + output.len()) / CHARS_PER_TOKEN;
    let cost = tokens as f64 / 1000.0 * model.cost_per_1k_tokens;

    ModelRunReport {
        output,
        overall_score: 8.0 + unit(0) * 2.0,
        accuracy: 8.0 + unit(1) * 2.0,
        helpfulness: 8.0 + unit(2) * 2.0,
        latency_ms: 1000.0 + unit(3) * 3000.0,
        cost,
        pass_rate: 80 + (digest[8] % 20) as u32,
    }
}
