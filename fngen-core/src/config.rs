//! Backend configuration
//!
//! Describes how to reach an OpenAI-compatible chat completions endpoint.
//! Loaded from TOML; the API key itself is read from the named environment
//! variable, never stored in the file.

use crate::errors::GenerationError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for an OpenAI-compatible generation backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Provider name, used in logs and error messages
    pub provider: String,

    /// Base URL; requests go to `{base_url}/chat/completions`
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::openai()
    }
}

impl BackendConfig {
    /// OpenAI chat completions
    pub fn openai() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4".to_string(),
            temperature: None,
            max_tokens: None,
            top_p: None,
            timeout_secs: None,
        }
    }

    /// Llama API chat completions
    pub fn llama() -> Self {
        Self {
            provider: "llama".to_string(),
            base_url: "https://api.llama-api.com".to_string(),
            api_key_env: "LLAMA_API_KEY".to_string(),
            model: "llama3.1-70b".to_string(),
            ..Self::openai()
        }
    }

    /// Preset by provider name
    pub fn preset(provider: &str) -> Option<Self> {
        match provider {
            "openai" => Some(Self::openai()),
            "llama" => Some(Self::llama()),
            _ => None,
        }
    }

    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate().context("Invalid backend configuration")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Check sampling and transport parameters
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.base_url.trim().is_empty() {
            return Err(GenerationError::config("Base URL cannot be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(GenerationError::config("Model cannot be empty"));
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(GenerationError::config("Temperature must be between 0.0 and 2.0"));
            }
        }
        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(GenerationError::config("TopP must be between 0.0 and 1.0"));
            }
        }
        if self.max_tokens == Some(0) {
            return Err(GenerationError::config("Max tokens must be a positive integer"));
        }
        if self.timeout_secs == Some(0) {
            return Err(GenerationError::config("Timeout must be a positive integer"));
        }
        Ok(())
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String, GenerationError> {
        let key = std::env::var(&self.api_key_env).map_err(|_| {
            GenerationError::auth(format!(
                "{} API key not found in ${}",
                self.provider, self.api_key_env
            ))
        })?;
        if key.trim().is_empty() {
            return Err(GenerationError::auth("API key cannot be null or empty"));
        }
        Ok(key)
    }
}
