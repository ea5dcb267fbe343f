//! Configuration management for streamscout
//!
//! Handles config file loading/saving and environment overrides.
//! Config is stored at ~/.config/streamscout/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::justwatch::DEFAULT_BASE_URL;
use crate::catalog;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Country used for searches when none is given (default "US")
    pub default_country: Option<String>,
    /// Language used for searches when none is given (default "en")
    pub default_language: Option<String>,
    /// Override for the JustWatch API base URL
    pub api_url: Option<String>,
    /// Request timeout in seconds (default 30)
    pub timeout_secs: Option<u64>,
    /// Regions to query for offers (default: all recognized regions)
    pub regions: Option<Vec<String>>,
}

impl Config {
    /// Get config file path (~/.config/streamscout/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("streamscout").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .filter(|p| p.exists())
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
            .with_env()
    }

    /// Load config from a specific file, warning and falling back to
    /// defaults if it cannot be read or parsed
    pub fn load_from(path: &Path) -> Self {
        Self::read(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "ignoring config: {:#}", e);
            Self::default()
        })
    }

    /// Read and parse a config file
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("invalid TOML in {}", path.display()))?;
        Ok(config)
    }

    /// Apply STREAMSCOUT_* environment overrides
    pub fn with_env(mut self) -> Self {
        if let Ok(country) = std::env::var("STREAMSCOUT_COUNTRY") {
            self.default_country = Some(country);
        }
        if let Ok(language) = std::env::var("STREAMSCOUT_LANGUAGE") {
            self.default_language = Some(language);
        }
        if let Ok(url) = std::env::var("STREAMSCOUT_API_URL") {
            self.api_url = Some(url);
        }
        self
    }

    pub fn country(&self) -> &str {
        self.default_country.as_deref().unwrap_or("US")
    }

    pub fn language(&self) -> &str {
        self.default_language.as_deref().unwrap_or("en")
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(30))
    }

    /// Regions to query, upper-cased; all recognized regions when unset
    pub fn regions(&self) -> Vec<String> {
        match &self.regions {
            Some(regions) if !regions.is_empty() => {
                regions.iter().map(|r| r.to_uppercase()).collect()
            }
            _ => catalog::all_countries(),
        }
    }

    /// Directory for the TUI log file
    pub fn log_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|p| p.join("streamscout"))
    }
}
