use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{WorkbenchError, WorkbenchResult};
use crate::settings::{
    estimate_cost, reset_settings, save_settings, EffectiveSettings, PersistentSettings,
    DEFAULT_MAX_TOKENS,
};
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub stored: PersistentSettings,
    pub effective: EffectiveSettings,
}

#[derive(Debug, Deserialize)]
pub struct CostQuery {
    pub evaluations: u64,
    pub tokens: Option<u64>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CostEstimate {
    pub evaluations: u64,
    pub tokens_per_evaluation: u64,
    pub cost_per_1k_tokens: Option<f64>,
    pub estimated_cost: f64,
}

fn respond(settings: PersistentSettings) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        effective: settings.effective(),
        stored: settings,
    })
}

/// GET /api/settings
pub async fn get_settings(State(state): State<SharedState>) -> Json<SettingsResponse> {
    respond(state.settings.read().await.clone())
}

/// PUT /api/settings: replaces the stored settings wholesale.
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(body): Json<PersistentSettings>,
) -> WorkbenchResult<Json<SettingsResponse>> {
    if body.budget.is_some_and(|b| b.is_nan() || b < 0.0) {
        return Err(WorkbenchError::InvalidInput(
            "budget must be a non-negative number".to_string(),
        ));
    }
    if body.temperature.is_some_and(|t| !(0.0..=2.0).contains(&t)) {
        return Err(WorkbenchError::InvalidInput(
            "temperature must be between 0 and 2".to_string(),
        ));
    }

    let mut settings = state.settings.write().await;
    *settings = body;
    save_settings(&state.settings_path, &settings);
    info!("Settings saved to {:?}", state.settings_path);
    Ok(respond(settings.clone()))
}

/// DELETE /api/settings
pub async fn reset(State(state): State<SharedState>) -> Json<SettingsResponse> {
    let mut settings = state.settings.write().await;
    *settings = PersistentSettings::default();
    reset_settings(&state.settings_path);
    info!("Settings reset to defaults");
    respond(settings.clone())
}

/// GET /api/settings/cost-estimate?evaluations=&tokens=&model=
pub async fn cost_estimate(
    State(state): State<SharedState>,
    Query(query): Query<CostQuery>,
) -> Json<CostEstimate> {
    // Unknown models are priced at the default rate.
    let cost_per_1k_tokens = query
        .model
        .as_deref()
        .and_then(|id| state.workbench.catalog().model(id))
        .map(|model| model.cost_per_1k_tokens);
    let tokens_per_evaluation = match query.tokens {
        Some(tokens) => tokens,
        None => state
            .settings
            .read()
            .await
            .max_tokens
            .unwrap_or(DEFAULT_MAX_TOKENS)
            .into(),
    };

    Json(CostEstimate {
        evaluations: query.evaluations,
        tokens_per_evaluation,
        cost_per_1k_tokens,
        estimated_cost: estimate_cost(query.evaluations, tokens_per_evaluation, cost_per_1k_tokens),
    })
}
