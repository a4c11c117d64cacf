//! Configuration loading, validation, and management for Weaver.
//!
//! Loads configuration from `~/.weaver/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use weaver_core::policy::{MediationPolicy, Principle};

/// The root configuration structure.
///
/// Maps directly to `~/.weaver/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the reasoning backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible endpoint
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model name sent to the backend
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Reason-act loop settings
    #[serde(default, rename = "loop")]
    pub reasoning: LoopConfig,

    /// Mediation policy override
    #[serde(default)]
    pub policy: PolicyConfig,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("reasoning", &self.reasoning)
            .field("policy", &self.policy)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Capability calls allowed per turn before it completes degraded
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Abort a turn when a tool fails instead of reporting the failure back
    #[serde(default)]
    pub fatal_tool_errors: bool,

    /// Bound on a whole turn, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_timeout_secs: Option<u64>,
}

fn default_max_iterations() -> u32 {
    25
}

impl LoopConfig {
    pub fn turn_timeout(&self) -> Option<Duration> {
        self.turn_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            fatal_tool_errors: false,
            turn_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Replaces the default header when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    /// Replaces the default principles when non-empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub principles: Vec<PrincipleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipleConfig {
    pub name: String,
    pub guidance: String,
}

impl PolicyConfig {
    /// Build the mediation policy, falling back to the canonical parts.
    pub fn build(&self) -> MediationPolicy {
        let mut policy = MediationPolicy::default();
        if let Some(header) = &self.header {
            policy.header = header.clone();
        }
        if !self.principles.is_empty() {
            policy.principles = self
                .principles
                .iter()
                .map(|p| Principle::new(&p.name, &p.guidance))
                .collect();
        }
        policy
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.weaver/config.toml).
    ///
    /// Environment variables override the file:
    /// - `WEAVER_API_KEY`, then `OPENAI_API_KEY`
    /// - `OPENAI_API_BASE`
    /// - `WEAVER_MODEL`, then `OPENAI_MODEL_NAME`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
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

    /// Apply environment-style overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("WEAVER_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(base) = lookup("OPENAI_API_BASE") {
            self.api_base = base;
        }
        if let Some(model) = lookup("WEAVER_MODEL").or_else(|| lookup("OPENAI_MODEL_NAME")) {
            self.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".weaver")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.reasoning.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "loop.max_iterations must be at least 1".into(),
            ));
        }

        if self.reasoning.turn_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "loop.turn_timeout_secs must be positive".into(),
            ));
        }

        if self.policy.principles.iter().any(|p| p.name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "every policy principle needs a name".into(),
            ));
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            reasoning: LoopConfig::default(),
            policy: PolicyConfig::default(),
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
