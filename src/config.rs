//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::catalog::Item;
use crate::extract::Currency;
use crate::fetch::render::DEFAULT_WAIT_MS;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Currency assumed when a page offers no better signal
    #[serde(default)]
    pub currency: Currency,

    /// Accept-Language header for direct fetches
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Optional User-Agent override for both tiers
    #[serde(default)]
    pub user_agent: Option<String>,

    /// How long the rendered tier waits for a price selector, in milliseconds
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Items to compare, each with its storefront offers
    #[serde(default)]
    pub items: Vec<Item>,
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_wait_ms() -> u64 {
    DEFAULT_WAIT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            accept_language: default_accept_language(),
            user_agent: None,
            wait_ms: default_wait_ms(),
            format: OutputFormat::Table,
            items: Vec::new(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("price-scout.toml");
        if local_config.exists() {
            debug!("Found price-scout.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("price-scout").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(currency) = std::env::var("PRICE_SCOUT_CURRENCY") {
            if let Ok(c) = currency.parse() {
                self.currency = c;
            }
        }

        if let Ok(wait) = std::env::var("PRICE_SCOUT_WAIT_MS") {
            if let Ok(w) = wait.parse() {
                self.wait_ms = w;
            }
        }

        if let Ok(ua) = std::env::var("PRICE_SCOUT_USER_AGENT") {
            self.user_agent = Some(ua);
        }

        self
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use: table, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
