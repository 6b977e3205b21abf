mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

use evallab_workbench::config::{BackendConfig, WorkbenchConfig};
use evallab_workbench::server::build_router;
use evallab_workbench::state::WorkbenchState;
use evallab_workbench::workbench::fakes::MemorySource;

use common::memory_source;

async fn router_with(source: MemorySource) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = WorkbenchConfig {
        backend: BackendConfig::Http {
            base: Url::parse("http://127.0.0.1:1/api").unwrap(),
        },
        datasets_api: Url::parse("http://127.0.0.1:1/api").unwrap(),
        port: 8090,
        data_dir: dir.path().to_path_buf(),
        fetch_timeout: None,
        log_file: None,
    };
    let state = WorkbenchState::open(config, Arc::new(source), reqwest::Client::new()).await;
    (build_router(Arc::new(state)), dir)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_multipart(router: &Router, uri: &str, parts: &[(&str, Option<&str>, &str)]) -> (StatusCode, Value) {
    const BOUNDARY: &str = "evallab-boundary";
    let mut body = String::new();
    for (name, file_name, content) in parts {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        match file_name {
            Some(file_name) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/csv\r\n\r\n",
                name, file_name
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                name
            )),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn send_json(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(router, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (router, _dir) = router_with(memory_source()).await;
    let (status, body) = send_json(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["evaluations"], 4);
    assert_eq!(body["selection"]["state"], "selected");
    assert_eq!(body["selection"]["id"], "e1");
}

#[tokio::test]
async fn test_evaluation_listing_and_errors() {
    let (router, _dir) = router_with(memory_source()).await;

    let (status, body) = send_json(&router, Method::GET, "/api/evaluations?project=p2&status=", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body.as_array().unwrap().iter().map(|e| e["id"].clone()).collect();
    assert_eq!(ids, vec![json!("e3"), json!("e4")]);

    let (status, body) = send_json(&router, Method::GET, "/api/evaluations?status=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    let (status, body) = send_json(&router, Method::GET, "/api/evaluations/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_projects() {
    let (router, _dir) = router_with(memory_source()).await;

    let (status, body) = send_json(&router, Method::GET, "/api/projects/p1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Support Bot");
    assert_eq!(body["evaluation_count"], 2);

    let (_, body) = send_json(&router, Method::GET, "/api/projects/recent?limit=1", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_run_endpoint() {
    let (router, _dir) = router_with(memory_source()).await;

    let (status, body) = send_json(
        &router,
        Method::POST,
        "/api/evaluations/e3/run",
        Some(json!({"prompt": "Be brief.", "user_input": "Hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "passed");
    assert_eq!(body["output"], "e3 :: Be brief. :: Hi");

    let (status, body) = send_json(
        &router,
        Method::POST,
        "/api/evaluations/e3/run",
        Some(json!({"prompt": "", "user_input": "Hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    let (_, history) = send_json(&router, Method::GET, "/activity/history", None).await;
    assert_eq!(history["total"], 1);
    assert_eq!(history["entries"][0]["source"], "run");
}

#[tokio::test]
async fn test_selection_endpoints() {
    let (router, _dir) = router_with(memory_source().with_logs("e2", "two")).await;

    let (status, body) = send_json(&router, Method::POST, "/api/selection/e2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], true);
    assert_eq!(body["view"]["logs"], "two");

    let (_, body) = send_json(&router, Method::GET, "/api/selection", None).await;
    assert_eq!(body["selection"]["id"], "e2");
}

#[tokio::test]
async fn test_comparison_and_export() {
    let (router, _dir) = router_with(memory_source().with_model_score("m2", 9.5)).await;

    let (status, _) = send_json(&router, Method::GET, "/api/comparisons/latest", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(
        &router,
        Method::POST,
        "/api/comparisons",
        Some(json!({"models": ["m1"], "prompt": "p", "input": "i"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_selection");

    let (status, body) = send_json(
        &router,
        Method::POST,
        "/api/comparisons",
        Some(json!({"models": ["m1", "m2"], "prompt": "p", "input": "i"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["winner"], "m2");

    let (status, csv) = send(&router, Method::GET, "/api/comparisons/latest/export?format=csv", None).await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(csv).unwrap();
    assert_eq!(csv.lines().count(), 3);

    let (status, _) = send(&router, Method::GET, "/api/comparisons/latest/export?format=xml", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_settings_roundtrip() {
    let (router, dir) = router_with(memory_source()).await;

    let (_, body) = send_json(&router, Method::GET, "/api/settings", None).await;
    assert_eq!(body["effective"]["budget"], 100.0);

    let (status, body) = send_json(
        &router,
        Method::PUT,
        "/api/settings",
        Some(json!({"budget": 20.0, "max_tokens": 500})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["effective"]["budget"], 20.0);
    assert!(dir.path().join("workbench-settings.json").exists());

    let (status, _) = send_json(
        &router,
        Method::PUT,
        "/api/settings",
        Some(json!({"temperature": 3.5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 10 runs x 500 tokens (saved max_tokens) at m1's 0.03 per 1k
    let (status, body) = send_json(
        &router,
        Method::GET,
        "/api/settings/cost-estimate?evaluations=10&model=m1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokens_per_evaluation"], 500);
    assert!((body["estimated_cost"].as_f64().unwrap() - 0.15).abs() < 1e-9);

    let (_, body) = send_json(&router, Method::DELETE, "/api/settings", None).await;
    assert_eq!(body["effective"]["budget"], 100.0);
    assert!(!dir.path().join("workbench-settings.json").exists());
}

#[tokio::test]
async fn test_datasets_fall_back_to_demo_list() {
    let (router, _dir) = router_with(memory_source()).await;

    let (status, body) = send_json(&router, Method::GET, "/api/datasets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"], "demo");
    assert_eq!(body["datasets"].as_array().unwrap().len(), 5);

    let (status, body) = send_json(&router, Method::POST, "/api/datasets/url", Some(json!({"url": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn test_dataset_upload_takes_file_contents_only() {
    let (router, _dir) = router_with(memory_source()).await;

    // A bare path is not a file: nothing on the host is read.
    let (status, body) = send_multipart(
        &router,
        "/api/datasets/upload",
        &[("name", None, "secrets"), ("path", None, "/etc/passwd")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    let (status, body) = send_multipart(
        &router,
        "/api/datasets/upload",
        &[("file", Some("empty.csv"), "")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    // The datasets API is unreachable in tests, so a well-formed upload
    // gets as far as forwarding and reports the backend as unavailable.
    let (status, body) = send_multipart(
        &router,
        "/api/datasets/upload",
        &[
            ("file", Some("reviews.csv"), "text,label\ngreat,positive"),
            ("description", None, "product reviews"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "source_unavailable");
}
