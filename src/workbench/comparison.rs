use chrono::Utc;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::catalog::CatalogStore;
use super::runner::validate_run_input;
use super::source::{with_timeout, DataSource};
use super::{ComparisonReport, ComparisonResult, Model};
use crate::config::{COMPARE_MAX_MODELS, COMPARE_MIN_MODELS};
use crate::error::{WorkbenchError, WorkbenchResult};

/// Runs one prompt/input pair across several models and ranks the outputs.
pub struct ComparisonExecutor {
    catalog: Arc<CatalogStore>,
    source: Arc<dyn DataSource>,
    timeout: Option<Duration>,
}

impl ComparisonExecutor {
    pub fn new(
        catalog: Arc<CatalogStore>,
        source: Arc<dyn DataSource>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            catalog,
            source,
            timeout,
        }
    }

    /// Fan out one run per model and join them all.
    ///
    /// Results follow the requested model order. The first failing model
    /// fails the whole comparison; runs still in flight are dropped.
    pub async fn compare(
        &self,
        model_ids: &[String],
        prompt: &str,
        user_input: &str,
    ) -> WorkbenchResult<ComparisonReport> {
        let models = self.resolve_selection(model_ids)?;
        validate_run_input(prompt, user_input)?;

        debug!("Comparing {} models", models.len());
        let runs = models.iter().map(|model| async move {
            with_timeout(
                self.timeout,
                self.source.submit_model_run(model, prompt, user_input),
            )
            .await
            .map(|report| ComparisonResult::from_report(model, report))
            .map_err(|e| WorkbenchError::run_failed(model.id.clone(), e))
        });
        let results = try_join_all(runs).await?;

        let winner = pick_winner(&results).map(|r| r.model_id.clone());
        Ok(ComparisonReport {
            prompt: prompt.to_string(),
            user_input: user_input.to_string(),
            results,
            winner,
            completed_at: Utc::now(),
        })
    }

    /// Collapse duplicates (first occurrence wins), enforce the 2..=5 bound
    /// and look each id up in the model catalog.
    fn resolve_selection(&self, model_ids: &[String]) -> WorkbenchResult<Vec<Model>> {
        let mut unique: Vec<&String> = Vec::with_capacity(model_ids.len());
        for id in model_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        if unique.len() < COMPARE_MIN_MODELS {
            return Err(WorkbenchError::InvalidSelection(format!(
                "select at least {} models to compare (got {})",
                COMPARE_MIN_MODELS,
                unique.len()
            )));
        }
        if unique.len() > COMPARE_MAX_MODELS {
            return Err(WorkbenchError::InvalidSelection(format!(
                "select no more than {} models (got {})",
                COMPARE_MAX_MODELS,
                unique.len()
            )));
        }

        unique
            .into_iter()
            .map(|id| {
                self.catalog.model(id).cloned().ok_or_else(|| {
                    WorkbenchError::InvalidSelection(format!("unknown model '{}'", id))
                })
            })
            .collect()
    }
}

/// Strictly greatest `overall_score`; ties go to the earliest entry.
/// NaN scores never win.
pub fn pick_winner(results: &[ComparisonResult]) -> Option<&ComparisonResult> {
    let mut best: Option<&ComparisonResult> = None;
    for result in results {
        if result.overall_score.is_nan() {
            continue;
        }
        if best.is_none_or(|b| result.overall_score > b.overall_score) {
            best = Some(result);
        }
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

pub fn export_report(report: &ComparisonReport, format: ExportFormat) -> WorkbenchResult<String> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| WorkbenchError::InvalidInput(format!("report not serializable: {}", e))),
        ExportFormat::Csv => Ok(export_csv(report)),
    }
}

const CSV_HEADER: &str =
    "model_id,model_name,overall_score,accuracy,helpfulness,latency_ms,cost,pass_rate,winner";

fn export_csv(report: &ComparisonReport) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for r in &report.results {
        let winner = report.winner.as_deref() == Some(r.model_id.as_str());
        out.push_str(&format!(
            "{},{},{:.2},{:.2},{:.2},{:.0},{:.4},{},{}\n",
            csv_field(&r.model_id),
            csv_field(&r.model_name),
            r.overall_score,
            r.accuracy,
            r.helpfulness,
            r.latency_ms,
            r.cost,
            r.pass_rate,
            winner
        ));
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
