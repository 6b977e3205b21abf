mod common;

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;

use evallab_workbench::activity::{ActivityLevel, ActivitySource};
use evallab_workbench::config::{BackendConfig, WorkbenchConfig};
use evallab_workbench::settings::{save_settings, PersistentSettings};
use evallab_workbench::state::WorkbenchState;
use evallab_workbench::workbench::fakes::{MemorySource, Operation};
use evallab_workbench::workbench::selection::SelectionState;

use common::memory_source;

fn test_config(data_dir: &Path) -> WorkbenchConfig {
    WorkbenchConfig {
        backend: BackendConfig::Http {
            base: Url::parse("http://127.0.0.1:1/api").unwrap(),
        },
        datasets_api: Url::parse("http://127.0.0.1:1/api").unwrap(),
        port: 8090,
        data_dir: data_dir.to_path_buf(),
        fetch_timeout: None,
        log_file: None,
    }
}

async fn open(data_dir: &Path, source: Arc<MemorySource>) -> WorkbenchState {
    WorkbenchState::open(test_config(data_dir), source, reqwest::Client::new()).await
}

#[tokio::test]
async fn test_state_opens_with_first_evaluation_selected() {
    let dir = TempDir::new().unwrap();
    let state = open(dir.path(), Arc::new(memory_source())).await;

    assert_eq!(state.workbench.catalog().projects().len(), 2);
    assert_eq!(state.workbench.repository().len(), 4);
    assert_eq!(
        state.workbench.selection().state(),
        SelectionState::Selected("e1".to_string())
    );
    assert!(state.workbench.last_comparison().is_none());
    assert!(state.activity.history().await.is_empty());
    assert_eq!(state.settings_path, dir.path().join("workbench-settings.json"));
}

#[tokio::test]
async fn test_state_falls_back_to_empty_collections() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(memory_source());
    source.fail(Operation::Catalogs);
    source.fail(Operation::Evaluations);

    let state = open(dir.path(), source).await;

    assert!(state.workbench.catalog().projects().is_empty());
    assert!(state.workbench.repository().is_empty());
    assert_eq!(state.workbench.selection().state(), SelectionState::NoSelection);

    let history = state.activity.history().await;
    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .all(|e| e.source == ActivitySource::Workbench && e.level == ActivityLevel::Warn));
}

#[tokio::test]
async fn test_initial_selection_failure_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(memory_source());
    source.fail(Operation::Logs);

    let state = open(dir.path(), source).await;
    assert_eq!(state.workbench.repository().len(), 4);
    assert_eq!(state.workbench.selection().state(), SelectionState::NoSelection);
}

#[tokio::test]
async fn test_state_loads_saved_settings() {
    let dir = TempDir::new().unwrap();
    let saved = PersistentSettings {
        budget: Some(12.5),
        default_model: Some("m2".to_string()),
        ..Default::default()
    };
    save_settings(&dir.path().join("workbench-settings.json"), &saved);

    let state = open(dir.path(), Arc::new(memory_source())).await;
    assert_eq!(*state.settings.read().await, saved);
}
