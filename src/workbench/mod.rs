pub mod catalog;
pub mod comparison;
pub mod fakes;
pub mod fixture;
pub mod http;
pub mod repository;
pub mod runner;
pub mod selection;
pub mod session;
pub mod source;
pub mod view;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Catalog records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Default model id for the project.
    #[serde(default)]
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub provider: String,
    #[serde(default, alias = "context_length")]
    pub context_window: u64,
    #[serde(default)]
    pub cost_per_1k_tokens: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalogs {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub models: Vec<Model>,
}

// ============================================================================
// Evaluation records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalStatus {
    Pending,
    Running,
    Passed,
    Failed,
}

impl EvalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalStatus::Pending => "pending",
            EvalStatus::Running => "running",
            EvalStatus::Passed => "passed",
            EvalStatus::Failed => "failed",
        }
    }

    /// A run result may only land in one of these.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EvalStatus::Passed | EvalStatus::Failed)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(EvalStatus::Pending),
            "running" => Some(EvalStatus::Running),
            "passed" => Some(EvalStatus::Passed),
            "failed" => Some(EvalStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for EvalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalMetadata {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub dataset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub model: String,
    pub status: EvalStatus,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub user_input: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub total_tests: Option<u32>,
    #[serde(default)]
    pub passed_tests: Option<u32>,
    #[serde(default)]
    pub metadata: Option<EvalMetadata>,
}

impl Evaluation {
    /// `passed_tests <= total_tests` whenever both are present.
    pub fn test_counts_consistent(&self) -> bool {
        match (self.passed_tests, self.total_tests) {
            (Some(passed), Some(total)) => passed <= total,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_name: String,
    pub status: TestStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub execution_time_ms: u64,
}

/// LLM judge ratings for one evaluation output. Every metric is on a 0-10 scale.
///
/// On the wire the metrics sit next to `overall` and `feedback` in a flat
/// object: `{"overall": 8.5, "accuracy": 9.0, "feedback": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeScore {
    pub overall: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, f64>,
}

/// What the backend reports after executing one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub output: String,
    pub status: EvalStatus,
    pub duration_ms: u64,
}

// ============================================================================
// Comparison records
// ============================================================================

/// Backend report for one model in a comparison batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRunReport {
    pub output: String,
    pub overall_score: f64,
    pub accuracy: f64,
    pub helpfulness: f64,
    pub latency_ms: f64,
    pub cost: f64,
    pub pass_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub model_id: String,
    pub model_name: String,
    pub output: String,
    pub overall_score: f64,
    pub accuracy: f64,
    pub helpfulness: f64,
    pub latency_ms: f64,
    pub cost: f64,
    pub pass_rate: u32,
}

impl ComparisonResult {
    pub fn from_report(model: &Model, report: ModelRunReport) -> Self {
        Self {
            model_id: model.id.clone(),
            model_name: model.name.clone(),
            output: report.output,
            overall_score: report.overall_score,
            accuracy: report.accuracy,
            helpfulness: report.helpfulness,
            latency_ms: report.latency_ms,
            cost: report.cost,
            pass_rate: report.pass_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub prompt: String,
    pub user_input: String,
    /// In the order the models were requested.
    pub results: Vec<ComparisonResult>,
    pub winner: Option<String>,
    pub completed_at: DateTime<Utc>,
}

// ============================================================================
// Query parameters
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub project_id: Option<String>,
    pub status: Option<EvalStatus>,
    pub model: Option<String>,
}

impl Filter {
    /// Build a filter from raw query strings, treating empty strings as absent.
    /// An unrecognized status is rejected.
    pub fn from_params(
        project_id: Option<&str>,
        status: Option<&str>,
        model: Option<&str>,
    ) -> Result<Self, String> {
        let non_empty = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);
        let status = match status.filter(|s| !s.is_empty()) {
            Some(s) => Some(EvalStatus::parse(s).ok_or_else(|| format!("unknown status '{}'", s))?),
            None => None,
        };
        Ok(Self {
            project_id: non_empty(project_id),
            status,
            model: non_empty(model),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.project_id.is_none() && self.status.is_none() && self.model.is_none()
    }

    pub fn matches(&self, evaluation: &Evaluation) -> bool {
        self.project_id
            .as_deref()
            .is_none_or(|p| evaluation.project_id == p)
            && self.status.is_none_or(|s| evaluation.status == s)
            && self.model.as_deref().is_none_or(|m| evaluation.model == m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(id: &str, project: &str, status: EvalStatus, model: &str) -> Evaluation {
        Evaluation {
            id: id.to_string(),
            project_id: project.to_string(),
            name: id.to_string(),
            model: model.to_string(),
            status,
            prompt: String::new(),
            user_input: String::new(),
            output: None,
            duration_ms: None,
            created_at: Utc::now(),
            total_tests: None,
            passed_tests: None,
            metadata: None,
        }
    }

    #[test]
    fn test_judge_score_flat_wire_format() {
        let json = r#"{"overall": 8.5, "accuracy": 9.0, "helpfulness": 8.0, "feedback": "Solid"}"#;
        let score: JudgeScore = serde_json::from_str(json).unwrap();
        assert_eq!(score.overall, 8.5);
        assert_eq!(score.feedback.as_deref(), Some("Solid"));
        assert_eq!(score.metrics.len(), 2);
        assert_eq!(score.metrics["accuracy"], 9.0);
        assert!(!score.metrics.contains_key("overall"));
    }

    #[test]
    fn test_filter_params_treat_empty_as_absent() {
        let filter = Filter::from_params(Some(""), Some(""), Some("gpt-4")).unwrap();
        assert!(filter.project_id.is_none());
        assert!(filter.status.is_none());
        assert_eq!(filter.model.as_deref(), Some("gpt-4"));

        assert!(Filter::from_params(None, Some("done"), None).is_err());
    }

    #[test]
    fn test_filter_matches_every_present_field() {
        let e = eval("e1", "p1", EvalStatus::Passed, "gpt-4");
        assert!(Filter::default().matches(&e));
        assert!(Filter {
            project_id: Some("p1".into()),
            status: Some(EvalStatus::Passed),
            model: Some("gpt-4".into()),
        }
        .matches(&e));
        assert!(!Filter {
            project_id: Some("p1".into()),
            status: Some(EvalStatus::Failed),
            model: None,
        }
        .matches(&e));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&EvalStatus::Running).unwrap(), "\"running\"");
        assert_eq!(EvalStatus::parse("passed"), Some(EvalStatus::Passed));
        assert!(EvalStatus::Failed.is_terminal());
        assert!(!EvalStatus::Pending.is_terminal());
    }

    #[test]
    fn test_test_counts_consistency() {
        let mut e = eval("e1", "p1", EvalStatus::Passed, "m");
        e.total_tests = Some(10);
        e.passed_tests = Some(8);
        assert!(e.test_counts_consistent());
        e.passed_tests = Some(11);
        assert!(!e.test_counts_consistent());
    }
}
