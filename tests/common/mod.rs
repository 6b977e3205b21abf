#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use evallab_workbench::workbench::catalog::CatalogStore;
use evallab_workbench::workbench::fakes::MemorySource;
use evallab_workbench::workbench::repository::EvaluationRepository;
use evallab_workbench::workbench::session::{Workbench, WorkbenchOptions};
use evallab_workbench::workbench::source::DataSource;
use evallab_workbench::workbench::{
    Catalogs, EvalStatus, Evaluation, JudgeScore, Model, Project, TestResult, TestStatus,
};

pub fn project(id: &str, name: &str, day: u32) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        model: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap(),
    }
}

pub fn model(id: &str, cost_per_1k_tokens: f64) -> Model {
    Model {
        id: id.to_string(),
        name: id.to_uppercase(),
        provider: "test".to_string(),
        context_window: 8192,
        cost_per_1k_tokens,
    }
}

pub fn evaluation(id: &str, project_id: &str, model: &str, status: EvalStatus) -> Evaluation {
    Evaluation {
        id: id.to_string(),
        project_id: project_id.to_string(),
        name: format!("{} run", id),
        model: model.to_string(),
        status,
        prompt: "You are helpful.".to_string(),
        user_input: "Hello".to_string(),
        output: None,
        duration_ms: None,
        created_at: Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
        total_tests: None,
        passed_tests: None,
        metadata: None,
    }
}

pub fn test_result(name: &str, status: TestStatus) -> TestResult {
    TestResult {
        test_name: name.to_string(),
        status,
        message: String::new(),
        execution_time_ms: 5,
    }
}

pub fn judge(overall: f64) -> JudgeScore {
    let mut metrics = BTreeMap::new();
    metrics.insert("accuracy".to_string(), overall);
    JudgeScore {
        overall,
        feedback: Some("fine".to_string()),
        metrics,
    }
}

pub fn catalogs() -> Catalogs {
    Catalogs {
        projects: vec![
            project("p1", "Support Bot", 10),
            project("p2", "Code Review", 12),
        ],
        models: vec![
            model("m1", 0.03),
            model("m2", 0.002),
            model("m3", 0.015),
            model("m4", 0.001),
            model("m5", 0.01),
            model("m6", 0.02),
        ],
    }
}

pub fn evaluations() -> Vec<Evaluation> {
    vec![
        evaluation("e1", "p1", "m1", EvalStatus::Passed),
        evaluation("e2", "p1", "m2", EvalStatus::Failed),
        evaluation("e3", "p2", "m1", EvalStatus::Pending),
        evaluation("e4", "p2", "m3", EvalStatus::Passed),
    ]
}

pub fn memory_source() -> MemorySource {
    MemorySource::new(catalogs(), evaluations())
}

pub async fn workbench(source: Arc<MemorySource>) -> Workbench {
    workbench_with(source, WorkbenchOptions::default()).await
}

pub async fn workbench_with(source: Arc<MemorySource>, options: WorkbenchOptions) -> Workbench {
    let dyn_source: Arc<dyn DataSource> = source;
    let catalog = CatalogStore::load(dyn_source.as_ref(), None).await.unwrap();
    let repository = EvaluationRepository::load(dyn_source.clone(), None)
        .await
        .unwrap();
    Workbench::new(
        Arc::new(catalog),
        Arc::new(repository),
        dyn_source,
        options,
    )
}
