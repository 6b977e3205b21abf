use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::{WorkbenchConfig, DEFAULT_COST_PER_1K_TOKENS, SETTINGS_FILE_NAME};

pub const DEFAULT_BUDGET: f64 = 100.0;
pub const DEFAULT_BUDGET_PERIOD: &str = "monthly";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// User preferences. Purely presentational: nothing in the workbench core
/// reads these, so their presence or absence cannot change evaluation data.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PersistentSettings {
    pub budget: Option<f64>,
    pub budget_period: Option<String>,
    pub default_model: Option<String>,
    pub auto_run: Option<bool>,
    pub notifications: Option<bool>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Settings with defaults filled in, as the settings page shows them.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EffectiveSettings {
    pub budget: f64,
    pub budget_period: String,
    pub default_model: Option<String>,
    pub auto_run: bool,
    pub notifications: bool,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl PersistentSettings {
    pub fn effective(&self) -> EffectiveSettings {
        EffectiveSettings {
            budget: self.budget.unwrap_or(DEFAULT_BUDGET),
            budget_period: self
                .budget_period
                .clone()
                .unwrap_or_else(|| DEFAULT_BUDGET_PERIOD.to_string()),
            default_model: self.default_model.clone().filter(|m| !m.is_empty()),
            auto_run: self.auto_run.unwrap_or(false),
            notifications: self.notifications.unwrap_or(false),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }
}

pub fn settings_path(config: &WorkbenchConfig) -> PathBuf {
    config.data_dir.join(SETTINGS_FILE_NAME)
}

pub fn load_settings(path: &Path) -> PersistentSettings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => PersistentSettings::default(),
    }
}

pub fn save_settings(path: &Path, settings: &PersistentSettings) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Failed to create settings dir {:?}: {}", parent, e);
            return;
        }
    }
    match serde_json::to_string_pretty(settings) {
        Ok(json) => {
            if let Err(e) = std::fs::write(path, json) {
                warn!("Failed to save settings to {:?}: {}", path, e);
            }
        }
        Err(e) => {
            warn!("Failed to serialize settings: {}", e);
        }
    }
}

pub fn reset_settings(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove settings {:?}: {}", path, e),
    }
}

/// Projected spend for `evaluations` runs of `tokens_per_evaluation` tokens.
pub fn estimate_cost(evaluations: u64, tokens_per_evaluation: u64, cost_per_1k: Option<f64>) -> f64 {
    let total_tokens = evaluations as f64 * tokens_per_evaluation as f64;
    total_tokens / 1000.0 * cost_per_1k.unwrap_or(DEFAULT_COST_PER_1K_TOKENS)
}
