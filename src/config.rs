//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has defaults, so a partial file (or none of a section) is fine.
//! Secrets are referenced by env-var name in the config and resolved at
//! runtime into `secrecy::Secret` values.

use anyhow::{Context, Result};
use secrecy::Secret;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::llm::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::logging::LogSink;
use crate::recap::aggregate::DEFAULT_TOP_N;
use crate::recap::prompt::DEFAULT_MOOD;
use crate::recap::runner::{RunnerConfig, DEFAULT_MAX_CONCURRENCY};
use crate::recap::RecapSettings;
use crate::yahoo::MAX_STATS_BATCH;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub recap: RecapConfig,
    pub llm: LlmConfig,
    pub yahoo: YahooConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub alerts: AlertsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RecapConfig {
    pub top_n: usize,
    pub max_concurrency: usize,
    pub generation_timeout_ms: u64,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub default_mood: String,
    /// Empty means the built-in hints.
    pub style_hints: Vec<String>,
    pub stats_batch_size: usize,
}

impl Default for RecapConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            generation_timeout_ms: 6_500,
            max_output_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            default_mood: DEFAULT_MOOD.to_string(),
            style_hints: Vec::new(),
            stats_batch_size: MAX_STATS_BATCH,
        }
    }
}

impl RecapConfig {
    pub fn settings(&self) -> RecapSettings {
        RecapSettings {
            top_n: self.top_n,
            default_mood: self.default_mood.clone(),
            style_hints: self.style_hints.clone(),
            runner: RunnerConfig {
                max_concurrency: self.max_concurrency,
                timeout: Duration::from_millis(self.generation_timeout_ms),
                max_tokens: self.max_output_tokens,
                temperature: self.temperature,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_key_env: String,
    /// Override for the Chat Completions endpoint.
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: crate::llm::openai::DEFAULT_MODEL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct YahooConfig {
    pub client_id_env: String,
    pub client_secret_env: String,
    pub redirect_uri: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            client_id_env: "YAHOO_CONSUMER_KEY".to_string(),
            client_secret_env: "YAHOO_CONSUMER_SECRET".to_string(),
            redirect_uri: "http://localhost:8888/auth/yahoo/callback".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8888,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file path. Console when absent.
    pub file: Option<PathBuf>,
    pub json: bool,
}

impl LoggingConfig {
    pub fn sink(&self) -> LogSink {
        match &self.file {
            Some(path) => LogSink::File(path.clone()),
            None => LogSink::Console,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AlertsConfig {
    pub telegram_bot_token_env: Option<String>,
    pub telegram_chat_id_env: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve an env-var name to a secret, `None` when unset or empty.
    pub fn resolve_secret(env_name: &str) -> Option<Secret<String>> {
        Self::resolve_env(env_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(Secret::new)
    }
}
