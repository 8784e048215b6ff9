use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::model::{PrecipitationUnit, TemperatureUnit, WindSpeedUnit};

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Upstream endpoints and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub geocoding_url: String,
    pub forecast_url: String,
    pub user_agent: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            user_agent: concat!("meteo/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl ApiConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Bounds applied by the resolver and the tool handlers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Limits {
    /// How many candidates a single geocoding search may return.
    pub max_search_results: usize,
    /// How many of those are offered when asking the user to pick one.
    pub max_elicitation_options: usize,
    pub max_forecast_days: u32,
    pub max_forecast_hours: u32,
    pub high_wind_threshold_kmh: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_search_results: 10,
            max_elicitation_options: 5,
            max_forecast_days: 16,
            max_forecast_hours: 168,
            high_wind_threshold_kmh: 50.0,
        }
    }
}

/// Units used when a tool call does not name its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UnitDefaults {
    pub temperature: TemperatureUnit,
    pub wind_speed: WindSpeedUnit,
    pub precipitation: PrecipitationUnit,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [limits]
/// max_elicitation_options = 5
///
/// [units]
/// temperature = "fahrenheit"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub limits: Limits,
    pub units: UnitDefaults,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meteo", "meteo")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        if limits.max_search_results == 0 || limits.max_elicitation_options == 0 {
            return Err(anyhow!("Search and elicitation limits must be at least 1"));
        }
        if limits.max_elicitation_options > limits.max_search_results {
            return Err(anyhow!(
                "max_elicitation_options ({}) must not exceed max_search_results ({})",
                limits.max_elicitation_options,
                limits.max_search_results
            ));
        }
        if limits.max_forecast_days == 0 || limits.max_forecast_hours == 0 {
            return Err(anyhow!("Forecast bounds must be at least 1"));
        }
        Ok(())
    }
}
