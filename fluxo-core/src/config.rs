//! Configuration management
//!
//! Compatible with the dashboard's settings.json format:
//! ```json
//! {
//!   "projection": { "horizonDaysBefore": 30, "horizonDaysAfter": 60 },
//!   "import": { "rejectPageSize": 50, "extraAliases": { "customer": ["Devedor"] } }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Raw settings.json structure (matching the desktop app format)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    projection: ProjectionSettings,
    #[serde(default)]
    import: ImportSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionSettings {
    #[serde(default = "default_horizon_before")]
    horizon_days_before: i64,
    #[serde(default = "default_horizon_after")]
    horizon_days_after: i64,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            horizon_days_before: default_horizon_before(),
            horizon_days_after: default_horizon_after(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportSettings {
    #[serde(default = "default_reject_page_size")]
    reject_page_size: i64,
    #[serde(default)]
    extra_aliases: HashMap<String, Vec<String>>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            reject_page_size: default_reject_page_size(),
            extra_aliases: HashMap::new(),
        }
    }
}

fn default_horizon_before() -> i64 {
    30
}

fn default_horizon_after() -> i64 {
    60
}

fn default_reject_page_size() -> i64 {
    50
}

/// Fluxo configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub horizon_days_before: i64,
    pub horizon_days_after: i64,
    pub reject_page_size: i64,
    /// Deployment-specific spreadsheet headers, keyed by canonical field
    pub extra_aliases: HashMap<String, Vec<String>>,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            horizon_days_before: default_horizon_before(),
            horizon_days_after: default_horizon_after(),
            reject_page_size: default_reject_page_size(),
            extra_aliases: HashMap::new(),
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the fluxo directory
    pub fn load(fluxo_dir: &Path) -> Result<Self> {
        let settings_path = fluxo_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        Ok(Self {
            horizon_days_before: raw.projection.horizon_days_before,
            horizon_days_after: raw.projection.horizon_days_after,
            reject_page_size: raw.import.reject_page_size,
            extra_aliases: raw.import.extra_aliases.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config to the fluxo directory.
    /// Preserves settings sections the core does not manage.
    pub fn save(&self, fluxo_dir: &Path) -> Result<()> {
        let settings_path = fluxo_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.projection.horizon_days_before = self.horizon_days_before;
        settings.projection.horizon_days_after = self.horizon_days_after;
        settings.import.reject_page_size = self.reject_page_size;
        settings.import.extra_aliases = self.extra_aliases.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.horizon_days_before, 30);
        assert_eq!(config.horizon_days_after, 60);
        assert_eq!(config.reject_page_size, 50);
        assert!(config.extra_aliases.is_empty());
    }

    #[test]
    fn test_partial_settings_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"projection": {"horizonDaysAfter": 90}}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.horizon_days_before, 30);
        assert_eq!(config.horizon_days_after, 90);
        assert_eq!(config.reject_page_size, 50);
    }

    #[test]
    fn test_save_preserves_unmanaged_sections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"theme": {"dark": true}, "import": {"rejectPageSize": 25}}"#,
        )
        .unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        assert_eq!(config.reject_page_size, 25);
        config.reject_page_size = 100;
        config
            .extra_aliases
            .insert("customer".to_string(), vec!["Devedor".to_string()]);
        config.save(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["theme"]["dark"], true);
        assert_eq!(value["import"]["rejectPageSize"], 100);
        assert_eq!(value["import"]["extraAliases"]["customer"][0], "Devedor");
    }
}
