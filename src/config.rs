use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5555/api/check";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// URL of the grammar service's check endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Quiet period after the last edit before a check is issued
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Vertical gap between a highlighted span and its tooltip
    #[serde(default = "default_tooltip_offset")]
    pub tooltip_offset: f64,

    /// Class appended to the wrapped field's own class name
    #[serde(default = "default_input_class")]
    pub input_class: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_debounce_ms() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_tooltip_offset() -> f64 {
    5.0
}

fn default_input_class() -> String {
    "text-input".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            tooltip_offset: default_tooltip_offset(),
            input_class: default_input_class(),
        }
    }
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    pub fn load(endpoint: Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global_config = Self::from_file(&global_path)?;
                config = config.merge(global_config);
            }
        }

        // Local config overrides global
        let local_path = PathBuf::from(".rectifier.toml");
        if local_path.exists() {
            let local_config = Self::from_file(&local_path)?;
            config = config.merge(local_config);
        }

        if let Some(endpoint) = endpoint {
            config.endpoint = endpoint;
        }

        log::debug!("loaded config: {:?}", config);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn merge(mut self, other: Self) -> Self {
        // Values left at their defaults in `other` don't clobber earlier layers
        if other.endpoint != default_endpoint() {
            self.endpoint = other.endpoint;
        }
        if other.debounce_ms != default_debounce_ms() {
            self.debounce_ms = other.debounce_ms;
        }
        if other.request_timeout_secs != default_request_timeout_secs() {
            self.request_timeout_secs = other.request_timeout_secs;
        }
        if other.tooltip_offset != default_tooltip_offset() {
            self.tooltip_offset = other.tooltip_offset;
        }
        if other.input_class != default_input_class() {
            self.input_class = other.input_class;
        }
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "rectifier").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, "http://127.0.0.1:5555/api/check");
        assert_eq!(config.debounce(), Duration::from_millis(600));
        assert_eq!(config.tooltip_offset, 5.0);
        assert_eq!(config.input_class, "text-input");
    }

    #[test]
    fn test_merge_configs() {
        let base = Config {
            debounce_ms: 250,
            ..Default::default()
        };
        let override_config = Config {
            endpoint: "http://grammar.local/api/check".to_string(),
            ..Default::default()
        };

        let merged = base.merge(override_config);
        assert_eq!(merged.endpoint, "http://grammar.local/api/check");
        assert_eq!(merged.debounce_ms, 250);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounce_ms = 300").unwrap();
        writeln!(file, "input_class = \"grammar-input\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.input_class, "grammar-input");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounce_ms = \"soon\"").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
