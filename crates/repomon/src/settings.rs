//! Persisted application settings.
//!
//! Stored as `settings.toml` under the platform config directory. The core
//! engine never writes this file itself; it hands the updated folder list to
//! [`SettingsStore`] through the [`SettingsSink`] seam on every add/remove.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use repomon_core::SettingsSink;
use serde::{Deserialize, Serialize};
use tracing::error;

pub const SETTINGS_FILE_NAME: &str = "settings.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Watched root folders, in add order.
    pub folders: Vec<String>,
    /// EnvFilter directive string, e.g. "info" or "repomon_git=trace".
    pub log_level: String,
    pub log_to_file: bool,
    pub refresh_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            log_level: "info".to_string(),
            log_to_file: true,
            refresh_interval_ms: 10_000,
        }
    }
}

impl Settings {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("repomon")
            .join(SETTINGS_FILE_NAME)
    }

    /// Load settings; an absent file yields defaults, an unparsable one is a
    /// hard error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Writes folder-list updates from the core back to the settings file.
pub struct SettingsStore {
    path: PathBuf,
    settings: Mutex<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf, settings: Settings) -> Self {
        Self {
            path,
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsSink for SettingsStore {
    fn save_folders(&self, paths: &[String]) {
        let mut settings = self.settings.lock().expect("settings lock poisoned");
        settings.folders = paths.to_vec();
        if let Err(e) = settings.save(&self.path) {
            error!(error = %e, "failed to persist settings");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);

        let settings = Settings {
            folders: vec!["/repos".to_string(), "~/code".to_string()],
            log_level: "debug".to_string(),
            log_to_file: false,
            refresh_interval_ms: 5000,
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.folders, settings.folders);
        assert_eq!(loaded.log_level, "debug");
        assert!(!loaded.log_to_file);
        assert_eq!(loaded.refresh_interval_ms, 5000);
    }

    #[test]
    fn absent_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = Settings::load(&dir.path().join("missing.toml")).unwrap();
        assert!(loaded.folders.is_empty());
        assert_eq!(loaded.log_level, "info");
        assert!(loaded.log_to_file);
        assert_eq!(loaded.refresh_interval_ms, 10_000);
    }

    #[test]
    fn sink_persists_updated_folder_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        let store = SettingsStore::new(path.clone(), Settings::default());

        store.save_folders(&["/repos/app".to_string()]);

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.folders, vec!["/repos/app".to_string()]);
    }
}
