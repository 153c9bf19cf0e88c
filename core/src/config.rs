use crate::confidence::StrategyKind;
use crate::errors::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Backend address used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8001";

/// Configuration struct for the TruthTriage client
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TriageConfig {
    /// Base URL of the TruthTriage backend
    pub api_base_url: Option<String>,
    /// Where chat history and preferences are stored
    pub data_dir: Option<PathBuf>,
    /// Confidence strategy overriding the profile's own
    pub confidence_strategy: Option<StrategyKind>,
    /// City used for specialist searches without asking
    pub default_location: Option<String>,
    pub log_level: Option<String>,
}

impl TriageConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> TriageResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                TriageError::ConfigError(format!("Failed to read config file: {}", e))
            })?;

            let config: Self = toml::from_str(&content).map_err(|e| {
                TriageError::ConfigError(format!("Failed to parse config file: {}", e))
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> TriageResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            TriageError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        // Ensure the directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                TriageError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            TriageError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_base_url: other
                .api_base_url
                .clone()
                .or_else(|| self.api_base_url.clone()),
            data_dir: other.data_dir.clone().or_else(|| self.data_dir.clone()),
            confidence_strategy: other.confidence_strategy.or(self.confidence_strategy),
            default_location: other
                .default_location
                .clone()
                .or_else(|| self.default_location.clone()),
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
        }
    }

    /// Backend URL without a trailing slash
    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    /// Configured data directory, or the platform default
    pub fn resolve_data_dir(&self, app_name: &str) -> TriageResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_default_data_dir(app_name),
        }
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> TriageResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        TriageError::ConfigError("Could not determine home directory".to_string())
    })?;

    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> TriageResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}

/// Helper function to get the default directory for history and preferences
pub fn get_default_data_dir(app_name: &str) -> TriageResult<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        TriageError::ConfigError("Could not determine data directory".to_string())
    })?;
    Ok(data_dir.join(app_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempdir().unwrap();
        let config = TriageConfig::load_from_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, TriageConfig::default());
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = TriageConfig {
            api_base_url: Some("http://triage.local:9000/".to_string()),
            confidence_strategy: Some(StrategyKind::Similarity),
            default_location: Some("Kolkata".to_string()),
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = TriageConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.api_base_url(), "http://triage.local:9000");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "confidence_strategy = \"guesswork\"").unwrap();
        let result = TriageConfig::load_from_file(&path);
        assert!(matches!(result, Err(TriageError::ConfigError(_))));
    }

    #[test]
    fn test_merge_prefers_other() {
        let file = TriageConfig {
            api_base_url: Some("http://file".to_string()),
            default_location: Some("Mumbai".to_string()),
            ..Default::default()
        };
        let flags = TriageConfig {
            api_base_url: Some("http://flag".to_string()),
            ..Default::default()
        };
        let merged = file.merge(&flags);
        assert_eq!(merged.api_base_url.as_deref(), Some("http://flag"));
        assert_eq!(merged.default_location.as_deref(), Some("Mumbai"));
    }
}
