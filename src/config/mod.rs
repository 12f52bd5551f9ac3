//! Configuration management for resource-fetcher.
//!
//! Configuration is read from `~/.config/resource-fetcher/config.toml`.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetcher::USER_AGENT;
use crate::retry::RetryPolicy;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub retry: RetryPolicy,
    pub fetch: FetchDefaults,
}

/// Settings for the underlying HTTP client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Overrides the User-Agent sent with every request
    pub user_agent: Option<String>,
    /// Connection timeout in seconds (default: 10)
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            connect_timeout_secs: 10,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(USER_AGENT)
    }
}

/// Defaults applied to fetchers built from the CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchDefaults {
    /// Print the URL in log lines instead of a friendly name
    pub show_url: bool,
    /// Surface request failures instead of returning nothing
    pub throw_on_error: bool,
}

impl Default for FetchDefaults {
    fn default() -> Self {
        Self {
            show_url: true,
            throw_on_error: false,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/resource-fetcher/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("resource-fetcher").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# resource-fetcher configuration

[http]
# User-Agent sent with every request (defaults to resource-fetcher/<version>)
# user_agent = "my-editor-tool/1.0"

# Connection timeout in seconds
connect_timeout_secs = 10

[retry]
# Total time budget for retries in milliseconds
timeout_ms = 3000

# Delay before the first retry in milliseconds
interval_ms = 100

# Multiplier applied to the delay after each retry
backoff = 2.0

[fetch]
# Show the URL in log lines
show_url = true

# Return an error instead of nothing when a download fails
throw_on_error = false
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let config: Config = toml::from_str(Config::default_config_content())
            .expect("Default config should be valid TOML");

        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.http.user_agent(), USER_AGENT);
        assert!(config.fetch.show_url);
        assert!(!config.fetch.throw_on_error);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[http]
user_agent = "editor-tool/2.0"

[retry]
interval_ms = 50
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.http.user_agent(), "editor-tool/2.0");
        assert_eq!(config.retry.interval_ms, 50);
        assert_eq!(config.retry.timeout_ms, 3000);
        assert_eq!(config.http.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.fetch.show_url);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[fetch]\nthrow_on_error = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.fetch.throw_on_error);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[retry\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_create_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_default_config(&path).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.retry, RetryPolicy::default());
    }
}
