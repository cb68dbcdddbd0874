//! Configuration types for agentchat.
//!
//! The config is a JSON file (`.agentchat/config.json` by default). Every
//! field has a default, so a partial or missing file is fine.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Directory holding the config file and the log.
pub const CONFIG_DIR: &str = ".agentchat";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Agent whose conversations are listed and created.
    #[serde(default = "default_agent_name")]
    pub agent_name: String,

    /// Which backend to talk to.
    #[serde(default)]
    pub backend: BackendConfig,

    /// UI tick interval in milliseconds.
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,

    /// How many ticks a notification stays on screen.
    #[serde(default = "default_notification_ticks")]
    pub notification_ticks: usize,
}

fn default_agent_name() -> String {
    "ai_chat_assistant".into()
}

fn default_tick_rate_ms() -> u64 {
    250
}

fn default_notification_ticks() -> usize {
    // ~3 seconds at the default tick rate
    12
}

fn default_true() -> bool {
    true
}

fn default_reply_delay_ms() -> u64 {
    400
}

fn default_poll_interval_ms() -> u64 {
    1000
}

/// Backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-process backend; nothing survives a restart.
    Memory {
        /// Answer user messages by echoing them.
        #[serde(default = "default_true")]
        echo: bool,
        /// Delay before the echo reply.
        #[serde(default = "default_reply_delay_ms")]
        reply_delay_ms: u64,
    },
    /// Remote REST service.
    Http {
        base_url: String,
        #[serde(default)]
        api_token: Option<String>,
        #[serde(default = "default_poll_interval_ms")]
        poll_interval_ms: u64,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Memory {
            echo: true,
            reply_delay_ms: default_reply_delay_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent_name: default_agent_name(),
            backend: BackendConfig::default(),
            tick_rate_ms: default_tick_rate_ms(),
            notification_ticks: default_notification_ticks(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config: Self = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Point the config at a remote service.
    pub fn use_http(&mut self, base_url: impl Into<String>, api_token: Option<String>) {
        let poll_interval_ms = match &self.backend {
            BackendConfig::Http {
                poll_interval_ms, ..
            } => *poll_interval_ms,
            BackendConfig::Memory { .. } => default_poll_interval_ms(),
        };
        self.backend = BackendConfig::Http {
            base_url: base_url.into(),
            api_token,
            poll_interval_ms,
        };
    }

    /// Check values serde cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent_name.trim().is_empty() {
            return Err(ConfigError::Invalid("agent_name must not be empty".into()));
        }
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::Invalid("tick_rate_ms must be positive".into()));
        }
        if let BackendConfig::Http {
            base_url,
            poll_interval_ms,
            ..
        } = &self.backend
        {
            url::Url::parse(base_url)
                .map_err(|e| ConfigError::Invalid(format!("base_url {base_url:?}: {e}")))?;
            if *poll_interval_ms == 0 {
                return Err(ConfigError::Invalid(
                    "poll_interval_ms must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agent_name, "ai_chat_assistant");
        assert_eq!(config.tick_rate_ms, 250);
        assert!(matches!(config.backend, BackendConfig::Memory { echo: true, .. }));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"agent_name":"helper"}"#).unwrap();
        assert_eq!(config.agent_name, "helper");
        assert_eq!(config.notification_ticks, 12);
        assert_eq!(config.backend, BackendConfig::default());
    }

    #[test]
    fn test_http_backend_parses() {
        let json = r#"{"backend":{"kind":"http","base_url":"https://example.com/api"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Http {
                base_url: "https://example.com/api".into(),
                api_token: None,
                poll_interval_ms: 1000,
            }
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_DIR).join(CONFIG_FILE);

        let mut config = Config::default();
        config.use_http("http://localhost:8080", Some("token".into()));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config {
            agent_name: "  ".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.agent_name = "agent".into();
        config.use_http("not a url", None);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
