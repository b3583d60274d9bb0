//! Configuration loading
//!
//! `Config` is read from `~/.config/agentprobe/config.toml`. Every section is
//! optional and falls back to defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable holding the default bearer token
pub const DEFAULT_TOKEN_ENV: &str = "DATABRICKS_TOKEN";

/// File name of the registry document
pub const REGISTRY_FILE: &str = "agents.toml";

/// Main configuration structure loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub auth: AuthConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Load configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the config directory path (~/.config/agentprobe)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("agentprobe"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }

    /// Get the default registry path
    pub fn default_registry_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join(REGISTRY_FILE))
    }

    /// Registry path after applying the configured override
    pub fn registry_path(&self) -> PathBuf {
        self.registry
            .path
            .clone()
            .or_else(Self::default_registry_path)
            .unwrap_or_else(|| PathBuf::from(REGISTRY_FILE))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry document location (defaults to ~/.config/agentprobe/agents.toml)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Environment variable read once at startup for the ambient token
    pub token_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: DEFAULT_TOKEN_ENV.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Show token usage under successful replies
    pub show_usage: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { show_usage: true }
    }
}
