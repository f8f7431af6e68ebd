use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::response::aggregate::StaleAnswerPolicy;

pub const HOME_ENV: &str = "FIELD_SURVEY_HOME";
const DEFAULT_HOME: &str = ".field-survey";
const SETTINGS_FILE: &str = "settings.json";
const DATABASE_FILE: &str = "field-survey.sqlite3";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub database_path: String,
    #[serde(default = "default_max_administrators")]
    pub max_administrators: usize,
    #[serde(default = "default_seed_username")]
    pub seed_admin_username: String,
    #[serde(default = "default_seed_password")]
    pub seed_admin_password: String,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default)]
    pub stale_answers: StaleAnswerPolicy,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_administrators() -> usize {
    3
}

fn default_seed_username() -> String {
    "admin".to_string()
}

fn default_seed_password() -> String {
    "admin123".to_string()
}

fn default_min_password_length() -> usize {
    6
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppSettings {
    pub fn default_for(root: &Path) -> Self {
        Self {
            database_path: root.join(DATABASE_FILE).to_string_lossy().to_string(),
            max_administrators: default_max_administrators(),
            seed_admin_username: default_seed_username(),
            seed_admin_password: default_seed_password(),
            min_password_length: default_min_password_length(),
            stale_answers: StaleAnswerPolicy::default(),
            log_level: default_log_level(),
        }
    }
}

/// Data directory: `override_dir`, then `$FIELD_SURVEY_HOME`, then
/// `./.field-survey`. Created if missing.
pub fn data_root(override_dir: Option<&Path>) -> Result<PathBuf, AppError> {
    let root = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME)),
    };
    fs::create_dir_all(&root)
        .map_err(|e| AppError::Settings(format!("Unable to create {}: {e}", root.display())))?;
    Ok(root)
}

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

pub fn load_settings(root: &Path) -> Result<AppSettings, AppError> {
    let path = settings_path(root);
    if !path.exists() {
        let defaults = AppSettings::default_for(root);
        save_settings(root, &defaults)?;
        return Ok(defaults);
    }
    let raw = fs::read_to_string(&path)
        .map_err(|e| AppError::Settings(format!("Unable to read {}: {e}", path.display())))?;
    if raw.trim().is_empty() {
        let defaults = AppSettings::default_for(root);
        save_settings(root, &defaults)?;
        return Ok(defaults);
    }
    serde_json::from_str(&raw)
        .map_err(|e| AppError::Settings(format!("Invalid settings JSON: {e}")))
}

pub fn save_settings(root: &Path, settings: &AppSettings) -> Result<(), AppError> {
    let path = settings_path(root);
    let payload = serde_json::to_string_pretty(settings)
        .map_err(|e| AppError::Settings(e.to_string()))?;
    crate::render::helpers::write_string(&path, &payload)
}
