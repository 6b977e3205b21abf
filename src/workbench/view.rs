//! Pure view-model helpers consumed by whatever renders the workbench.

use serde::Serialize;

use super::{Evaluation, JudgeScore, TestResult, TestStatus};

/// Everything a detail pane needs for the selected evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationView {
    pub evaluation: Evaluation,
    pub project_name: String,
    pub test_results: Vec<TestResult>,
    pub test_summary: TestSummary,
    pub logs: String,
    pub judge_score: Option<JudgeScore>,
    /// `duration_ms` as shown in the header, e.g. `2.35s`.
    pub duration_display: String,
    /// Judge metrics in key order with display labels.
    pub judge_metrics: Vec<MetricView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricView {
    pub key: String,
    pub label: String,
    pub value: f64,
}

impl EvaluationView {
    pub fn new(
        evaluation: Evaluation,
        project_name: String,
        test_results: Vec<TestResult>,
        logs: String,
        judge_score: Option<JudgeScore>,
    ) -> Self {
        let judge_metrics = judge_score
            .as_ref()
            .map(|score| {
                score
                    .metrics
                    .iter()
                    .map(|(key, value)| MetricView {
                        key: key.clone(),
                        label: format_metric_name(key),
                        value: *value,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            duration_display: format_duration(evaluation.duration_ms),
            test_summary: TestSummary::from_results(&test_results),
            evaluation,
            project_name,
            test_results,
            logs,
            judge_score,
            judge_metrics,
        }
    }

    /// Swap in a newer copy of the same evaluation, keeping artifacts.
    pub fn set_evaluation(&mut self, evaluation: Evaluation) {
        self.duration_display = format_duration(evaluation.duration_ms);
        self.evaluation = evaluation;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestSummary {
    pub passed: usize,
    pub total: usize,
    /// Percentage rounded to one decimal; 0 when there are no tests.
    pub pass_rate: f64,
}

impl TestSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let total = results.len();
        let passed = results
            .iter()
            .filter(|r| r.status == TestStatus::Passed)
            .count();
        let pass_rate = if total == 0 {
            0.0
        } else {
            (passed as f64 / total as f64 * 1000.0).round() / 10.0
        };
        Self {
            passed,
            total,
            pass_rate,
        }
    }
}

/// `N/A` for missing or zero, `850ms` under a second, `2.35s` above.
pub(crate) fn format_duration(ms: Option<u64>) -> String {
    match ms {
        None | Some(0) => "N/A".to_string(),
        Some(ms) if ms < 1000 => format!("{}ms", ms),
        Some(ms) => format!("{:.2}s", ms as f64 / 1000.0),
    }
}

/// `response_time` -> `Response Time`
pub(crate) fn format_metric_name(metric: &str) -> String {
    metric
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
