use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::aggregate::DayBoundary;
use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_COUNTRY: &str = "JP";
pub const DEFAULT_LANGUAGE: &str = "ja";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_KEY: &str = "OPENWEATHER_API_KEY";
pub const ENV_BASE_URL: &str = "OPENWEATHER_BASE_URL";
pub const ENV_LANGUAGE: &str = "WEATHER_LANG";
pub const ENV_DEFAULT_COUNTRY: &str = "WEATHER_DEFAULT_COUNTRY";
pub const ENV_DAY_BOUNDARY: &str = "WEATHER_DAY_BOUNDARY";
pub const ENV_TIMEOUT_SECS: &str = "WEATHER_TIMEOUT_SECS";

/// Configuration stored on disk. Every field is optional; see [`ProviderSettings`]
/// for the validated form.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// language = "en"
/// default_country = "GB"
/// day_boundary = "city"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub language: Option<String>,
    pub default_country: Option<String>,
    pub day_boundary: Option<DayBoundary>,
    pub timeout_secs: Option<u64>,
}

/// Everything the OpenWeather client and the service need, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub default_country: String,
    pub day_boundary: DayBoundary,
    pub timeout_secs: u64,
}

impl ProviderSettings {
    /// Settings with the given key and defaults for everything else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            default_country: DEFAULT_COUNTRY.to_string(),
            day_boundary: DayBoundary::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; blank values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_API_KEY) {
            self.api_key = Some(v);
        }
        if let Some(v) = get(ENV_BASE_URL) {
            self.base_url = Some(v);
        }
        if let Some(v) = get(ENV_LANGUAGE) {
            self.language = Some(v);
        }
        if let Some(v) = get(ENV_DEFAULT_COUNTRY) {
            self.default_country = Some(v);
        }
        if let Some(v) = get(ENV_DAY_BOUNDARY) {
            self.day_boundary = Some(v.parse()?);
        }
        if let Some(v) = get(ENV_TIMEOUT_SECS) {
            let secs = v
                .parse::<u64>()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a whole number, got '{v}'"))?;
            self.timeout_secs = Some(secs);
        }

        Ok(self)
    }

    /// Set or replace the API key.
    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Validate and fill in defaults. Fails when no API key is present or the
    /// timeout is zero.
    pub fn provider_settings(&self) -> Result<ProviderSettings, ConfigError> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut settings = ProviderSettings::new(api_key);
        if let Some(url) = &self.base_url {
            settings.base_url = url.clone();
        }
        if let Some(language) = &self.language {
            settings.language = language.clone();
        }
        if let Some(country) = &self.default_country {
            settings.default_country = country.clone();
        }
        if let Some(boundary) = self.day_boundary {
            settings.day_boundary = boundary;
        }
        match self.timeout_secs {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => settings.timeout_secs = secs,
            None => {}
        }

        Ok(settings)
    }
}
