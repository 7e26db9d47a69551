//! Console configuration.
//!
//! Layered, later layers win: built-in defaults, the TOML file, then
//! `AGENTFLOW_*` environment variables. Command-line flags are applied on
//! top by the binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use agentflow_protocol::{DEFAULT_STREAM_URL, MASTER_NODE};

pub const ENV_STREAM_URL: &str = "AGENTFLOW_STREAM_URL";
pub const ENV_TERMINAL_NODE: &str = "AGENTFLOW_TERMINAL_NODE";
pub const ENV_LOG_FILE: &str = "AGENTFLOW_LOG_FILE";

const MIN_TICK_RATE_MS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid stream url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("stream url must use http or https, got {0:?}")]
    UnsupportedScheme(String),

    #[error("terminal node name must not be empty")]
    EmptyTerminalNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// SSE endpoint of the agent flow producer.
    pub stream_url: String,
    /// Node whose `complete` event ends a run.
    pub terminal_node: String,
    /// Redraw / input poll interval of the terminal canvas.
    pub tick_rate_ms: u64,
    /// Log file used while the terminal canvas owns the screen.
    pub log_file: Option<PathBuf>,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            stream_url: DEFAULT_STREAM_URL.to_string(),
            terminal_node: MASTER_NODE.to_string(),
            tick_rate_ms: 100,
            log_file: None,
            log_filter: "info".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// `<config dir>/agentflow/console.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("agentflow").join("console.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Load defaults, then the file, then the process environment.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment-style lookups. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_STREAM_URL) {
            self.stream_url = v;
        }
        if let Some(v) = get(ENV_TERMINAL_NODE) {
            self.terminal_node = v;
        }
        if let Some(v) = get(ENV_LOG_FILE) {
            self.log_file = Some(PathBuf::from(v));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stream_url()?;
        if self.terminal_node.trim().is_empty() {
            return Err(ConfigError::EmptyTerminalNode);
        }
        Ok(())
    }

    pub fn stream_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.stream_url.trim()).map_err(|source| ConfigError::InvalidUrl {
            url: self.stream_url.clone(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(MIN_TICK_RATE_MS))
    }

    /// Configured log file, else `<data dir>/agentflow/console.log`.
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|d| d.join("agentflow").join("console.log"))
                .unwrap_or_else(|| PathBuf::from("agentflow-console.log"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_local_producer() {
        let config = ConsoleConfig::default();
        assert_eq!(config.stream_url, "http://localhost:8000/stream");
        assert_eq!(config.terminal_node, "DB-MASTER");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ConsoleConfig::from_toml("tick_rate_ms = 250\n").unwrap();
        assert_eq!(config.tick_rate(), Duration::from_millis(250));
        assert_eq!(config.terminal_node, MASTER_NODE);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = ConsoleConfig::from_toml("stream_url = \"http://file:1/stream\"").unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_STREAM_URL, "https://env.example/stream"),
            (ENV_TERMINAL_NODE, "  "),
        ]
        .into_iter()
        .collect();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.stream_url, "https://env.example/stream");
        // blank values do not clobber
        assert_eq!(config.terminal_node, MASTER_NODE);
    }

    #[test]
    fn rejects_bad_urls() {
        let mut config = ConsoleConfig::default();
        config.stream_url = "not a url".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

        config.stream_url = "ftp://host/stream".into();
        assert!(matches!(config.validate(), Err(ConfigError::UnsupportedScheme(s)) if s == "ftp"));
    }

    #[test]
    fn rejects_empty_terminal_node() {
        let config = ConsoleConfig {
            terminal_node: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyTerminalNode)));
    }

    #[test]
    fn tick_rate_has_a_floor() {
        let config = ConsoleConfig {
            tick_rate_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.tick_rate(), Duration::from_millis(MIN_TICK_RATE_MS));
    }
}
