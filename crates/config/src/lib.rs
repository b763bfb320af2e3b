//! Configuration loading, validation, and management for supportdesk.
//!
//! Loads configuration from `~/.supportdesk/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default system persona prepended to every prompt.
pub const DEFAULT_PERSONA: &str = "You are a highly polite, customer-focused assistant. \
Always greet users warmly, answer with respect, and maintain a professional tone. \
Your main goal is to deliver excellent customer experience and provide accurate, \
specific information about GitHub Actions.";

/// The root configuration structure.
///
/// Maps directly to `~/.supportdesk/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// System persona prepended to every prompt.
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Gateway (HTTP server) configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Generation backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Knowledge base configuration.
    #[serde(default)]
    pub kb: KbConfig,
}

fn default_persona() -> String {
    DEFAULT_PERSONA.into()
}

/// Redact a secret string for Debug output.
fn redact(s: &str) -> &'static str {
    if s.is_empty() { "<empty>" } else { "[REDACTED]" }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("persona", &self.persona)
            .field("gateway", &self.gateway)
            .field("auth", &self.auth)
            .field("backend", &self.backend)
            .field("kb", &self.kb)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Sliding-window rate limit: requests per minute per client.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: usize,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_rate_limit() -> usize {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Symmetric signing key for session tokens. Override via
    /// `SUPPORTDESK_SIGNING_KEY` in any real deployment.
    #[serde(default = "default_signing_key")]
    pub signing_key: String,

    /// Session lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

fn default_signing_key() -> String {
    "dev-signing-key".into()
}
fn default_token_ttl() -> i64 {
    3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: default_signing_key(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_key", &redact(&self.signing_key))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Model alias or path to a local GGUF file.
    #[serde(default = "default_model")]
    pub model: String,

    /// Context window ceiling in model-native tokens.
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// How long a request may wait for the admission gate before being
    /// rejected as resource-exhausted.
    #[serde(default = "default_queue_timeout")]
    pub queue_timeout_secs: u64,
}

fn default_model() -> String {
    "tinyllama".into()
}
fn default_context_window() -> usize {
    2048
}
fn default_queue_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            context_window: default_context_window(),
            queue_timeout_secs: default_queue_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KbConfig {
    /// Path to a TOML knowledge base file. `None` uses the built-in FAQ.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.supportdesk/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `SUPPORTDESK_SIGNING_KEY`
    /// - `SUPPORTDESK_MODEL`
    /// - `SUPPORTDESK_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(key) = std::env::var("SUPPORTDESK_SIGNING_KEY") {
            config.auth.signing_key = key;
        }
        if let Ok(model) = std::env::var("SUPPORTDESK_MODEL") {
            config.backend.model = model;
        }
        if let Ok(port) = std::env::var("SUPPORTDESK_PORT") {
            config.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError("SUPPORTDESK_PORT must be a port number".into())
            })?;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".supportdesk")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.context_window == 0 {
            return Err(ConfigError::ValidationError(
                "backend.context_window must be greater than zero".into(),
            ));
        }
        if self.auth.token_ttl_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.token_ttl_secs must be positive".into(),
            ));
        }
        if self.persona.is_empty() {
            return Err(ConfigError::ValidationError(
                "persona must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            gateway: GatewayConfig::default(),
            auth: AuthConfig::default(),
            backend: BackendConfig::default(),
            kb: KbConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.backend.context_window, 2048);
        assert!(config.persona.contains("GitHub Actions"));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.backend.model, config.backend.model);
    }

    #[test]
    fn zero_context_window_rejected() {
        let mut config = AppConfig::default();
        config.backend.context_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.backend.model, "tinyllama");
    }

    #[test]
    fn signing_key_redacted_in_debug() {
        let config = AppConfig::default();
        let debug = format!("{config:?}");
        assert!(!debug.contains("dev-signing-key"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str("[gateway]\nport = 9000\n").unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.backend.context_window, 2048);
        assert_eq!(config.auth.token_ttl_secs, 3600);
    }
}
