use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::ingest::MappedIngestorConfig;

/// Overrides `database_path` when set.
pub const DATABASE_ENV: &str = "BUDGET_DATABASE_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Enabled catalog plugins, in selection order.
    #[serde(default)]
    pub plugins: Vec<String>,
    #[serde(default)]
    pub mapped_ingestors: Vec<MappedIngestorConfig>,
}

fn default_database_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("budget-ingest")
        .join("budget.db")
        .to_string_lossy()
        .to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            plugins: Vec::new(),
            mapped_ingestors: Vec::new(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("budget-ingest")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Read settings from `path`; a missing or unreadable file gives defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings");
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

/// Settings from the user's config directory with the environment override
/// applied.
pub fn load_settings() -> Settings {
    let mut settings = load_settings_from(&settings_path());
    if let Ok(db) = std::env::var(DATABASE_ENV) {
        if !db.is_empty() {
            settings.database_path = db;
        }
    }
    settings
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| IngestError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}
