use crate::platform::Platform;
use crate::sequence::DEFAULT_SEQUENCE_TIMEOUT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dispatcher: DispatcherConfig,
    pub logging: LoggingConfig,

    /// Bindings for the key tester
    /// Format: "key spec" -> "label"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Maximum gap between two keys of a sequence
    pub sequence_timeout_ms: u64,

    /// Override platform detection (decides what `super` means)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// Events from these targets are not matched against bindings
    pub ignored_targets: Vec<String>,

    /// Number of keys kept for the debug view
    pub max_history: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence
    pub filter: String,

    /// Entries kept in the in-memory log buffer
    pub capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            sequence_timeout_ms: DEFAULT_SEQUENCE_TIMEOUT.as_millis() as u64,
            platform: None,
            ignored_targets: vec![
                "input".to_string(),
                "textarea".to_string(),
                "select".to_string(),
            ],
            max_history: 50,
        }
    }
}

impl DispatcherConfig {
    pub fn sequence_timeout(&self) -> Duration {
        Duration::from_millis(self.sequence_timeout_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            capacity: 1000,
        }
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            // Create default config if it doesn't exist
            info!(target: "config", "Creating default config at {:?}", config_path);
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&config_path, Self::create_default_with_comments())?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(target: "config", "Loading config from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        debug!(target: "config", "Saved config to {:?}", path);

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ed-keys").join("config.toml"))
    }

    /// Bindings for the key tester, in spec order
    pub fn binding_labels(&self) -> Vec<(&str, &str)> {
        self.bindings
            .iter()
            .flatten()
            .map(|(spec, label)| (spec.as_str(), label.as_str()))
            .collect()
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# ed-keys Configuration File
# Location: ~/.config/ed-keys/config.toml (Linux)
#           ~/Library/Application Support/ed-keys/config.toml (macOS)
#           %APPDATA%\ed-keys\config.toml (Windows)

[dispatcher]
# Maximum time between two keys of a sequence like "g g", in milliseconds
sequence_timeout_ms = 500

# Override platform detection: "mac", "windows", "linux" or "other"
# On mac "super" means command, everywhere else it means ctrl
# platform = "mac"

# Key events coming from these targets are not matched against bindings
ignored_targets = ["input", "textarea", "select"]

# Number of recent keys shown in the debug view
max_history = 50

[logging]
# Filter directives, e.g. "debug" or "info,keys=trace"
# RUST_LOG overrides this value
filter = "info"

# Number of log entries kept in memory
capacity = 1000

# Bindings used by key_tester when no specs are given on the command line
# [bindings]
# "super + s" = "save"
# "shift + tab" = "outdent"
# "g g" = "top"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dispatcher.sequence_timeout_ms, 500);
        assert_eq!(
            config.dispatcher.sequence_timeout(),
            Duration::from_millis(500)
        );
        assert_eq!(
            config.dispatcher.ignored_targets,
            vec!["input", "textarea", "select"]
        );
        assert_eq!(config.logging.filter, "info");
        assert!(config.bindings.is_none());
    }

    #[test]
    fn test_commented_default_matches_default() {
        let parsed = Config::from_toml_str(&Config::create_default_with_comments()).unwrap();
        let default = Config::default();
        assert_eq!(parsed.dispatcher, default.dispatcher);
        assert_eq!(parsed.logging, default.logging);
        assert!(parsed.bindings.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
[dispatcher]
sequence_timeout_ms = 800
platform = "mac"

[bindings]
"super + s" = "save"
"g g" = "top"
"#,
        )
        .unwrap();

        assert_eq!(config.dispatcher.sequence_timeout_ms, 800);
        assert_eq!(config.dispatcher.platform, Some(Platform::Mac));
        assert_eq!(config.dispatcher.max_history, 50);
        assert_eq!(config.logging.capacity, 1000);
        assert_eq!(
            config.binding_labels(),
            vec![("g g", "top"), ("super + s", "save")]
        );
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(Config::from_toml_str("[dispatcher]\nsequence_timeout_ms = \"soon\"").is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.dispatcher.platform = Some(Platform::Linux);
        config.dispatcher.ignored_targets = vec!["input".to_string()];
        config.bindings = Some(BTreeMap::from([(
            "ctrl + b".to_string(),
            "bold".to_string(),
        )]));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.dispatcher, config.dispatcher);
        assert_eq!(loaded.binding_labels(), vec![("ctrl + b", "bold")]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
