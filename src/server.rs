use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{activity, catalog, comparison, datasets, evaluation, health, settings};
use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health::health))
        // Catalogs
        .route("/api/projects", get(catalog::list_projects))
        .route("/api/projects/recent", get(catalog::recent_projects))
        .route("/api/projects/{id}", get(catalog::get_project))
        .route("/api/models", get(catalog::list_models))
        // Evaluations
        .route("/api/evaluations", get(evaluation::list_evaluations))
        .route(
            "/api/evaluations/refresh",
            post(evaluation::refresh_evaluations),
        )
        .route("/api/evaluations/{id}", get(evaluation::get_evaluation))
        .route(
            "/api/evaluations/{id}/results",
            get(evaluation::test_results),
        )
        .route("/api/evaluations/{id}/logs", get(evaluation::logs))
        .route("/api/evaluations/{id}/judge", get(evaluation::judge_score))
        .route("/api/evaluations/{id}/run", post(evaluation::run_evaluation))
        // Selection
        .route("/api/selection", get(evaluation::current_selection))
        .route("/api/selection/{id}", post(evaluation::select_evaluation))
        // Comparisons
        .route("/api/comparisons", post(comparison::run_comparison))
        .route(
            "/api/comparisons/latest",
            get(comparison::latest_comparison),
        )
        .route(
            "/api/comparisons/latest/export",
            get(comparison::export_latest),
        )
        // Datasets
        .route("/api/datasets", get(datasets::list_datasets))
        .route("/api/datasets/url", post(datasets::import_url))
        .route("/api/datasets/github", post(datasets::import_github))
        .route("/api/datasets/upload", post(datasets::upload_dataset))
        .route(
            "/api/datasets/{id}",
            axum::routing::delete(datasets::delete_dataset),
        )
        // Settings
        .route(
            "/api/settings",
            get(settings::get_settings)
                .put(settings::update_settings)
                .delete(settings::reset),
        )
        .route(
            "/api/settings/cost-estimate",
            get(settings::cost_estimate),
        )
        // Activity
        .route("/activity/history", get(activity::activity_history))
        .route("/activity/stream", get(activity::activity_stream))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
