//! Gateway configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! `VENTURE_*` environment variables. Command line flags on the binaries
//! are applied last.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Supported generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openrouter")]
    OpenRouter,
    /// Deterministic offline payloads, for tests and demos only
    Stub,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "openrouter" => Some(ProviderKind::OpenRouter),
            "stub" => Some(ProviderKind::Stub),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Stub => "stub",
        }
    }
}

/// Settings for the generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: None,
            temperature: Some(0.7),
            max_tokens: None,
            timeout_seconds: 60,
        }
    }
}

impl LlmSettings {
    /// Base URL with the provider default filled in, without a trailing slash.
    pub fn resolved_base_url(&self) -> String {
        let base = match (&self.base_url, self.provider) {
            (Some(url), _) => url.as_str(),
            (None, ProviderKind::OpenRouter) => OPENROUTER_BASE_URL,
            (None, _) => OPENAI_BASE_URL,
        };
        base.trim_end_matches('/').to_string()
    }

    /// Per-call timeout. A zero from a config file is raised to one second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

/// Settings for the trajectory loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Pause between two consecutive years.
    pub year_delay_ms: u64,
    /// Frames buffered between the driver and the HTTP body.
    pub channel_capacity: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            year_delay_ms: 1000,
            channel_capacity: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind_addr: String,
    pub allow_stub_provider: bool,
    pub llm: LlmSettings,
    pub simulation: SimulationSettings,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            allow_stub_provider: false,
            llm: LlmSettings::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl GatewayConfig {
    /// Create a configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Defaults or `path`, then the process environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `VENTURE_*` overrides read through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("VENTURE_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(provider) = lookup("VENTURE_LLM_PROVIDER") {
            self.llm.provider =
                ProviderKind::parse(&provider).ok_or_else(|| ConfigError::InvalidValue {
                    key: "VENTURE_LLM_PROVIDER".to_string(),
                    value: provider.clone(),
                })?;
        }
        if let Some(model) = lookup("VENTURE_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(key) = lookup("VENTURE_LLM_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("VENTURE_LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(value) = lookup("VENTURE_LLM_TEMPERATURE") {
            self.llm.temperature = Some(parse_value("VENTURE_LLM_TEMPERATURE", &value)?);
        }
        if let Some(value) = lookup("VENTURE_LLM_MAX_TOKENS") {
            self.llm.max_tokens = Some(parse_value("VENTURE_LLM_MAX_TOKENS", &value)?);
        }
        if let Some(value) = lookup("VENTURE_LLM_TIMEOUT") {
            let seconds: u64 = parse_value("VENTURE_LLM_TIMEOUT", &value)?;
            if seconds == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "VENTURE_LLM_TIMEOUT".to_string(),
                    value,
                });
            }
            self.llm.timeout_seconds = seconds;
        }
        if let Some(value) = lookup("VENTURE_YEAR_DELAY_MS") {
            self.simulation.year_delay_ms = parse_value("VENTURE_YEAR_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("VENTURE_ALLOW_STUB_PROVIDER") {
            self.allow_stub_provider = value == "1" || value.eq_ignore_ascii_case("true");
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
