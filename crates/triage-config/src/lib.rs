//! Environment-driven configuration for the triage server.

use std::path::PathBuf;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are assisting an on-call engineer with root-cause analysis of a customer incident.";

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be a valid port number, got {0:?}")]
    InvalidPort(String),

    #[error("OLLAMA_TIMEOUT_SECS must be a positive integer, got {0:?}")]
    InvalidTimeout(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

/// Deployment environment, controls the console log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Settings for the Ollama-backed completion agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    pub model: String,
    pub base_url: String,
    pub system_prompt: String,
    /// No timeout unless explicitly configured.
    pub timeout: Option<Duration>,
}

/// Settings for the structured logger and access log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub level: String,
    pub environment: Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub ollama: OllamaConfig,
    pub log: LogConfig,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        let timeout = match var("OLLAMA_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => None,
        };

        let base_url = var("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.into());

        let ollama = OllamaConfig {
            model: var("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.into()),
            base_url: base_url.trim_end_matches('/').to_string(),
            system_prompt: var("SYSTEM_PROMPT").unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.into()),
            timeout,
        };

        let environment = Environment::parse(var("NODE_ENV").or_else(|| var("APP_ENV")).as_deref());

        let log = LogConfig {
            dir: PathBuf::from(var("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.into())),
            level: var("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.into()),
            environment,
        };

        Ok(Self { port, ollama, log })
    }
}
