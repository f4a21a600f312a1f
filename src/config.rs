//! Configuration management for Accountdesk
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::constants::{
    CODE_LENGTH_MAX, CODE_LENGTH_MIN, CONFIG_GENERATED, DEFAULT_ACCESS_TOKEN_ENV, DEFAULT_BASE_URL,
    REQUEST_TIMEOUT_MAX_SECS, RESEND_COOLDOWN_MAX_SECS,
};
use crate::registration::DEFAULT_CODE_LENGTH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub registration: RegistrationConfig,
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root URL of the account service, without a trailing `/api`
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Environment variable holding the bearer token for admin endpoints
    pub access_token_env: String,
}

/// Registration dialog behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Number of digits in a verification code
    pub code_length: usize,
    /// Seconds before another code may be requested
    pub resend_cooldown_secs: u32,
    /// Minimum password length, in characters
    pub min_password_length: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write log records to a file under the data directory
    pub enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            access_token_env: DEFAULT_ACCESS_TOKEN_ENV.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the access token from the configured environment variable.
    pub fn access_token(&self) -> Option<String> {
        if self.access_token_env.is_empty() {
            return None;
        }
        std::env::var(&self.access_token_env)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            resend_cooldown_secs: 60,
            min_password_length: 8,
        }
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("accountdesk.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("accountdesk").join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match url::Url::parse(&self.api.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => anyhow::bail!("base_url must use http or https, got '{}'", url.scheme()),
            Err(e) => anyhow::bail!("Invalid base_url '{}': {}", self.api.base_url, e),
        }

        if self.api.timeout_secs == 0 || self.api.timeout_secs > REQUEST_TIMEOUT_MAX_SECS {
            anyhow::bail!(
                "timeout_secs must be between 1 and {}, got {}",
                REQUEST_TIMEOUT_MAX_SECS,
                self.api.timeout_secs
            );
        }

        let code_length = self.registration.code_length;
        if !(CODE_LENGTH_MIN..=CODE_LENGTH_MAX).contains(&code_length) {
            anyhow::bail!(
                "code_length must be between {} and {} digits, got {}",
                CODE_LENGTH_MIN,
                CODE_LENGTH_MAX,
                code_length
            );
        }

        let cooldown = self.registration.resend_cooldown_secs;
        if cooldown == 0 || cooldown > RESEND_COOLDOWN_MAX_SECS {
            anyhow::bail!(
                "resend_cooldown_secs must be between 1 and {}, got {}",
                RESEND_COOLDOWN_MAX_SECS,
                cooldown
            );
        }

        if self.registration.min_password_length == 0 {
            anyhow::bail!("min_password_length must be at least 1");
        }

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        let header = format!(
            "# Accountdesk Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join("accountdesk"))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
