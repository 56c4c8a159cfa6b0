//! Configuration management for cite-chat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{CiteChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the API credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable holding the assistant identifier
pub const ASSISTANT_ID_ENV: &str = "ASSISTANT_ID";

/// Main configuration structure for cite-chat
///
/// Read once at startup and immutable afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Assistant service connection settings
    #[serde(default)]
    pub assistant: AssistantConfig,
    /// Run polling behavior
    #[serde(default)]
    pub polling: PollingConfig,
    /// Conversation/thread handling
    #[serde(default)]
    pub conversation: ConversationConfig,
}

/// Assistant service configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// API credential; prefer the `OPENAI_API_KEY` environment variable
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Identifier of the hosted assistant (e.g. `asst_abc123`)
    #[serde(default)]
    pub assistant_id: String,

    /// Base URL of the API (useful for tests and proxies)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request HTTP timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            assistant_id: String::new(),
            api_base: default_api_base(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("assistant_id", &self.assistant_id)
            .field("api_base", &self.api_base)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

/// Run polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between status checks (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    /// Overall time budget for one run (seconds)
    #[serde(default = "default_poll_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of status checks for one run
    #[serde(default = "default_poll_max_attempts")]
    pub max_attempts: u32,
}

fn default_poll_interval() -> u64 {
    500
}

fn default_poll_timeout() -> u64 {
    300
}

fn default_poll_max_attempts() -> u32 {
    600
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            timeout_seconds: default_poll_timeout(),
            max_attempts: default_poll_max_attempts(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Conversation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Keep one thread for the whole session; `false` creates a new thread
    /// for every prompt
    #[serde(default = "default_reuse_thread")]
    pub reuse_thread: bool,
}

fn default_reuse_thread() -> bool {
    true
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            reuse_thread: default_reuse_thread(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration. Call [`Config::validate`]
    /// before using it.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CiteChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| CiteChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_key) = std::env::var(API_KEY_ENV) {
            self.assistant.api_key = Some(api_key);
        }

        if let Ok(assistant_id) = std::env::var(ASSISTANT_ID_ENV) {
            self.assistant.assistant_id = assistant_id;
        }

        if let Ok(api_base) = std::env::var("CITECHAT_API_BASE") {
            tracing::debug!(api_base = %api_base, "Env override: CITECHAT_API_BASE");
            self.assistant.api_base = api_base;
        }

        if let Ok(interval) = std::env::var("CITECHAT_POLL_INTERVAL_MS") {
            match interval.parse() {
                Ok(v) => self.polling.interval_ms = v,
                Err(_) => tracing::warn!("Invalid CITECHAT_POLL_INTERVAL_MS: {}", interval),
            }
        }

        if let Ok(timeout) = std::env::var("CITECHAT_POLL_TIMEOUT_SECONDS") {
            match timeout.parse() {
                Ok(v) => self.polling.timeout_seconds = v,
                Err(_) => tracing::warn!("Invalid CITECHAT_POLL_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(attempts) = std::env::var("CITECHAT_POLL_MAX_ATTEMPTS") {
            match attempts.parse() {
                Ok(v) => self.polling.max_attempts = v,
                Err(_) => tracing::warn!("Invalid CITECHAT_POLL_MAX_ATTEMPTS: {}", attempts),
            }
        }

        if let Ok(reuse) = std::env::var("CITECHAT_REUSE_THREAD") {
            match reuse.to_lowercase().parse::<bool>() {
                Ok(v) => self.conversation.reuse_thread = v,
                Err(_) => tracing::warn!("Invalid CITECHAT_REUSE_THREAD: {}", reuse),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(assistant_id) = &cli.assistant_id {
            self.assistant.assistant_id = assistant_id.clone();
        }

        if let Some(api_base) = &cli.api_base {
            self.assistant.api_base = api_base.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Missing credentials or assistant id are fatal: the program cannot
    /// talk to the service without them.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let has_key = self
            .assistant
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            return Err(CiteChatError::MissingCredentials(format!(
                "{} is not set",
                API_KEY_ENV
            ))
            .into());
        }

        if self.assistant.assistant_id.trim().is_empty() {
            return Err(CiteChatError::Config(format!(
                "assistant.assistant_id is required (or set {})",
                ASSISTANT_ID_ENV
            ))
            .into());
        }

        let api_base = url::Url::parse(&self.assistant.api_base).map_err(|e| {
            CiteChatError::Config(format!(
                "Invalid assistant.api_base '{}': {}",
                self.assistant.api_base, e
            ))
        })?;
        if !matches!(api_base.scheme(), "http" | "https") {
            return Err(CiteChatError::Config(format!(
                "assistant.api_base must use http or https, got {}",
                api_base.scheme()
            ))
            .into());
        }

        if self.assistant.request_timeout_seconds == 0 {
            return Err(CiteChatError::Config(
                "assistant.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.polling.interval_ms == 0 {
            return Err(CiteChatError::Config(
                "polling.interval_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.polling.timeout_seconds == 0 {
            return Err(CiteChatError::Config(
                "polling.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.polling.max_attempts == 0 {
            return Err(CiteChatError::Config(
                "polling.max_attempts must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
