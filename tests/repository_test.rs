mod common;

use std::sync::Arc;

use evallab_workbench::error::WorkbenchError;
use evallab_workbench::workbench::catalog::{CatalogStore, UNKNOWN_PROJECT};
use evallab_workbench::workbench::fakes::{MemorySource, Operation};
use evallab_workbench::workbench::repository::EvaluationRepository;
use evallab_workbench::workbench::{EvalStatus, Filter, TestStatus};

use common::{catalogs, evaluations, judge, memory_source, test_result};

async fn repository(source: Arc<MemorySource>) -> EvaluationRepository {
    EvaluationRepository::load(source, None).await.unwrap()
}

#[tokio::test]
async fn test_list_matches_every_filter_field() {
    let repo = repository(Arc::new(memory_source())).await;

    let filters = [
        Filter::default(),
        Filter {
            project_id: Some("p1".to_string()),
            ..Default::default()
        },
        Filter {
            status: Some(EvalStatus::Passed),
            ..Default::default()
        },
        Filter {
            project_id: Some("p2".to_string()),
            model: Some("m1".to_string()),
            ..Default::default()
        },
        Filter {
            project_id: Some("p3".to_string()),
            ..Default::default()
        },
    ];

    let all = repo.all();
    for filter in &filters {
        let listed = repo.list(filter);
        // Every listed record matches; every matching record is listed, in order.
        let expected: Vec<_> = all.iter().filter(|e| filter.matches(e)).cloned().collect();
        assert_eq!(listed, expected, "filter {:?}", filter);
    }

    let ids: Vec<_> = repo
        .list(&Filter {
            status: Some(EvalStatus::Passed),
            ..Default::default()
        })
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["e1", "e4"]);
}

#[tokio::test]
async fn test_empty_filter_values_mean_unfiltered() {
    let filter = Filter::from_params(Some(""), Some(""), None).unwrap();
    assert!(filter.is_empty());

    let repo = repository(Arc::new(memory_source())).await;
    assert_eq!(repo.list(&filter).len(), 4);

    assert!(Filter::from_params(None, Some("exploded"), None).is_err());
}

#[tokio::test]
async fn test_get_unknown_is_not_found() {
    let repo = repository(Arc::new(memory_source())).await;
    let err = repo.get("nope").unwrap_err();
    assert!(matches!(err, WorkbenchError::NotFound { kind: "Evaluation", .. }));
}

#[tokio::test]
async fn test_apply_run_result_changes_only_run_fields() {
    let repo = repository(Arc::new(memory_source())).await;
    let before = repo.get("e3").unwrap();

    let updated = repo
        .apply_run_result("e3", "fresh output", EvalStatus::Passed, 1234)
        .unwrap();

    assert_eq!(updated.status, EvalStatus::Passed);
    assert_eq!(updated.output.as_deref(), Some("fresh output"));
    assert_eq!(updated.duration_ms, Some(1234));
    assert_eq!(repo.get("e3").unwrap(), updated);

    let mut expected = before;
    expected.status = EvalStatus::Passed;
    expected.output = Some("fresh output".to_string());
    expected.duration_ms = Some(1234);
    assert_eq!(updated, expected);

    let err = repo
        .apply_run_result("missing", "x", EvalStatus::Failed, 1)
        .unwrap_err();
    assert!(matches!(err, WorkbenchError::NotFound { .. }));
}

#[tokio::test]
async fn test_artifacts_absent_vs_unavailable() {
    let source = Arc::new(
        memory_source()
            .with_test_results("e1", vec![test_result("greets", TestStatus::Passed)])
            .with_logs("e1", "started\nfinished")
            .with_judge_score("e1", judge(8.5)),
    );
    let repo = repository(source.clone()).await;

    assert_eq!(repo.test_results("e1").await.unwrap().len(), 1);
    assert_eq!(repo.logs("e1").await.unwrap(), "started\nfinished");
    assert_eq!(repo.judge_score("e1").await.unwrap().unwrap().overall, 8.5);

    // No data is not an error.
    assert!(repo.test_results("e2").await.unwrap().is_empty());
    assert_eq!(repo.logs("e2").await.unwrap(), "");
    assert!(repo.judge_score("e2").await.unwrap().is_none());

    source.fail(Operation::Logs);
    let err = repo.logs("e1").await.unwrap_err();
    assert!(matches!(
        err,
        WorkbenchError::ArtifactUnavailable { artifact: "logs", .. }
    ));
}

#[tokio::test]
async fn test_refresh_failure_keeps_contents() {
    let source = Arc::new(memory_source());
    let repo = repository(source.clone()).await;
    repo.apply_run_result("e1", "local", EvalStatus::Failed, 1)
        .unwrap();

    source.fail(Operation::Evaluations);
    let err = repo.refresh().await.unwrap_err();
    assert!(matches!(err, WorkbenchError::SourceUnavailable { .. }));
    assert_eq!(repo.get("e1").unwrap().status, EvalStatus::Failed);

    source.recover(Operation::Evaluations);
    assert_eq!(repo.refresh().await.unwrap(), 4);
    assert_eq!(repo.get("e1").unwrap().status, EvalStatus::Passed);
}

#[tokio::test]
async fn test_load_failure_is_source_unavailable() {
    let source = Arc::new(memory_source());
    source.fail(Operation::Evaluations);
    let err = EvaluationRepository::load(source.clone(), None)
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), "source_unavailable");

    source.fail(Operation::Catalogs);
    assert!(CatalogStore::load(source.as_ref(), None).await.is_err());
}

#[tokio::test]
async fn test_catalog_lookups() {
    let catalog = CatalogStore::new(catalogs());
    assert_eq!(catalog.project_name("p1"), "Support Bot");
    assert_eq!(catalog.project_name("ghost"), UNKNOWN_PROJECT);
    assert_eq!(catalog.model_name("m2"), "M2");
    assert_eq!(catalog.model_name("ghost-model"), "ghost-model");

    let count = evaluations().iter().filter(|e| e.project_id == "p2").count();
    let summary = catalog.project_summary("p2", count).unwrap();
    assert_eq!(summary.evaluation_count, 2);
    assert!(catalog.project_summary("ghost", 0).is_none());
}
