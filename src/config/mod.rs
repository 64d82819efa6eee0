//! Configuration management for CLI, environment variables, and config files.

use crate::error::{StageError, ValidationIssue};
use crate::tree::Priority;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Main configuration for torrent-stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub submit: SubmitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the Transmission RPC connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Defaults applied to every submission unless overridden per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
    /// Destination directory; when absent the server's default applies.
    pub download_dir: Option<String>,
    /// Bandwidth priority: "low", "normal" or "high".
    pub priority: String,
    /// Add torrents paused instead of starting them immediately.
    pub paused: bool,
}

/// Configuration for logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9091/transmission/rpc".to_string(),
            username: None,
            password: None,
        }
    }
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            priority: "normal".to_string(),
            paused: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &PathBuf) -> Result<Self, StageError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StageError::IoError(e.to_string()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| StageError::ParseError(e.to_string()))
            }
            _ => toml::from_str(&content).map_err(|e| StageError::ParseError(e.to_string())),
        }
    }

    pub fn from_default_locations() -> Result<Self, StageError> {
        let config_dirs = [
            dirs::config_dir().map(|d| d.join("torrent-stage/config.toml")),
            Some(PathBuf::from("/etc/torrent-stage/config.toml")),
            Some(PathBuf::from("./torrent-stage.toml")),
        ];

        for path in config_dirs.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    pub fn merge_from_env(mut self) -> Result<Self, StageError> {
        if let Ok(val) = std::env::var("TORRENT_STAGE_RPC_URL") {
            self.rpc.url = val;
        }
        if let Ok(val) = std::env::var("TORRENT_STAGE_DOWNLOAD_DIR") {
            self.submit.download_dir = Some(val);
        }
        if let Ok(val) = std::env::var("TORRENT_STAGE_PRIORITY") {
            self.submit.priority = val;
        }
        if let Ok(val) = std::env::var("TORRENT_STAGE_LOG_LEVEL") {
            self.logging.level = val;
        }

        // Auth credentials - support both individual fields and combined format
        if let Ok(auth_str) = std::env::var("TORRENT_STAGE_AUTH_USERPASS") {
            if let Some((username, password)) = auth_str.split_once(':') {
                self.rpc.username = Some(username.to_string());
                self.rpc.password = Some(password.to_string());
            }
        } else {
            if let Ok(val) = std::env::var("TORRENT_STAGE_AUTH_USERNAME") {
                self.rpc.username = Some(val);
            }
            if let Ok(val) = std::env::var("TORRENT_STAGE_AUTH_PASSWORD") {
                self.rpc.password = Some(val);
            }
        }

        Ok(self)
    }

    pub fn merge_from_cli(mut self, cli: &CliOverrides) -> Self {
        if let Some(ref url) = cli.url {
            self.rpc.url = url.clone();
        }
        if let Some(ref username) = cli.username {
            self.rpc.username = Some(username.clone());
        }
        if let Some(ref password) = cli.password {
            self.rpc.password = Some(password.clone());
        }
        if let Some(ref dir) = cli.download_dir {
            self.submit.download_dir = Some(dir.clone());
        }
        if let Some(priority) = cli.priority {
            self.submit.priority = priority.to_string().to_lowercase();
        }
        if let Some(paused) = cli.paused {
            self.submit.paused = paused;
        }
        self
    }

    pub fn load_with_cli(cli: &CliOverrides) -> Result<Self, StageError> {
        let base = match &cli.config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::from_default_locations()?,
        };
        Ok(base.merge_from_env()?.merge_from_cli(cli))
    }

    /// Parsed bandwidth priority; `validate()` guarantees this succeeds.
    pub fn bandwidth_priority(&self) -> Priority {
        Priority::from_str(&self.submit.priority).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), StageError> {
        let mut issues = Vec::new();

        if self.rpc.url.is_empty() {
            issues.push(ValidationIssue {
                field: "rpc.url".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else if let Err(e) = reqwest::Url::parse(&self.rpc.url) {
            issues.push(ValidationIssue {
                field: "rpc.url".to_string(),
                message: format!("Invalid URL format: {}", e),
            });
        }

        if Priority::from_str(&self.submit.priority).is_err() {
            issues.push(ValidationIssue {
                field: "submit.priority".to_string(),
                message: format!(
                    "Invalid priority '{}'. Valid values: low, normal, high",
                    self.submit.priority
                ),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            issues.push(ValidationIssue {
                field: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(StageError::ValidationError(issues))
        }
    }
}

/// Command-line values that override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub download_dir: Option<String>,
    pub priority: Option<Priority>,
    pub paused: Option<bool>,
    pub config_file: Option<PathBuf>,
}
