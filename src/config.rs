use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Planner defaults applied when the CLI flags are absent
    pub settings: PlannerSettings,

    /// Logging configuration
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Planner defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Whether caffeine planning is on by default
    pub caffeine_enabled: bool,

    /// Default output format (table, json)
    pub output_format: String,

    /// Catalog file to load instead of the built-in products
    pub catalog_path: Option<PathBuf>,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            caffeine_enabled: false,
            output_format: "table".to_string(),
            catalog_path: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            metadata: ConfigMetadata {
                version: "1".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: PlannerSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Default config file location in the platform config directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fuelrs")
            .join("config.toml")
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration as TOML, creating parent directories as needed
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let raw = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(!config.settings.caffeine_enabled);
        assert_eq!(config.settings.output_format, "table");
        assert!(config.settings.catalog_path.is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.settings.output_format, "table");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.settings.caffeine_enabled = true;
        config.settings.output_format = "json".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert!(loaded.settings.caffeine_enabled);
        assert_eq!(loaded.settings.output_format, "json");
        assert_eq!(loaded.metadata.version, "1");
    }

    #[test]
    fn test_save_touches_updated_at() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        let created = config.metadata.created_at;
        config.save(&path).unwrap();
        assert!(config.metadata.updated_at >= created);
    }
}
