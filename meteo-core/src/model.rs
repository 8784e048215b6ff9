use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One geocoding match for a free-text query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub admin1: Option<String>,
    #[serde(default)]
    pub admin2: Option<String>,
    pub timezone: String,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub elevation: Option<f64>,
}

/// The single location a query resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub admin1: Option<String>,
    pub admin2: Option<String>,
    pub timezone: String,
    pub population: Option<u64>,
    pub elevation: Option<f64>,
}

impl From<LocationCandidate> for ResolvedLocation {
    fn from(c: LocationCandidate) -> Self {
        Self {
            id: c.id,
            name: c.name,
            latitude: c.latitude,
            longitude: c.longitude,
            country: c.country,
            admin1: c.admin1,
            admin2: c.admin2,
            timezone: c.timezone,
            population: c.population,
            elevation: c.elevation,
        }
    }
}

/// Temperature unit accepted by the forecast API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

/// Wind speed unit accepted by the forecast API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WindSpeedUnit {
    #[default]
    Kmh,
    Ms,
    Mph,
    Kn,
}

/// Precipitation unit accepted by the forecast API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PrecipitationUnit {
    #[default]
    Mm,
    Inch,
}

// `as_str`, `all`, `Display` and `TryFrom<&str>` over the lower-case wire tokens.
macro_rules! wire_tokens {
    ($name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }

            pub const fn all() -> &'static [$name] {
                &[$($name::$variant),+]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<&str> for $name {
            type Error = anyhow::Error;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                match value.to_lowercase().as_str() {
                    $($token => Ok($name::$variant),)+
                    _ => Err(anyhow::anyhow!(
                        "Unknown unit '{value}'. Supported: {}.",
                        [$($token),+].join(", ")
                    )),
                }
            }
        }
    };
}

wire_tokens!(TemperatureUnit { Celsius => "celsius", Fahrenheit => "fahrenheit" });
wire_tokens!(WindSpeedUnit { Kmh => "kmh", Ms => "ms", Mph => "mph", Kn => "kn" });
wire_tokens!(PrecipitationUnit { Mm => "mm", Inch => "inch" });

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub location: ResolvedLocation,
    pub temperature: f64,
    pub temperature_unit: String,
    pub humidity: f64,
    pub weather_description: String,
    pub weather_code: i64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub wind_speed_unit: String,
    pub pressure: f64,
    pub cloud_cover: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub temperature_unit: String,
    pub weather_description: String,
    pub weather_code: i64,
    pub precipitation_sum: f64,
    pub precipitation_unit: String,
    pub wind_speed_max: f64,
    pub wind_direction_dominant: f64,
    pub wind_speed_unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub location: ResolvedLocation,
    pub forecast_days: Vec<DailyForecast>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyWeatherPoint {
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
    pub weather_code: i64,
    pub weather_description: String,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub cloud_cover: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub location: ResolvedLocation,
    pub hourly_data: Vec<HourlyWeatherPoint>,
    pub temperature_unit: String,
    pub precipitation_unit: String,
    pub wind_speed_unit: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    SevereWeather,
    WeatherAdvisory,
    WindWarning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// `"current"` or the timestamp of the hourly sample that triggered it.
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertReport {
    pub location: ResolvedLocation,
    pub alerts: Vec<WeatherAlert>,
    pub alert_count: usize,
    pub checked_at: DateTime<Utc>,
}
