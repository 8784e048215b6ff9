use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::{
    config::UnitDefaults,
    error::{Error, Result},
    model::{LocationCandidate, PrecipitationUnit, TemperatureUnit, WindSpeedUnit},
};

mod http;
pub mod open_meteo;

pub use open_meteo::OpenMeteoClient;

/// Geocoding lookup: one request per call, ordered candidates.
#[async_trait]
pub trait LocationSearch: Send + Sync + Debug {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<LocationCandidate>>;
}

/// Forecast lookup: one request per call, raw grouped response.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResponse>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub current: Vec<&'static str>,
    pub hourly: Vec<&'static str>,
    pub daily: Vec<&'static str>,
    pub forecast_days: u32,
    pub temperature_unit: TemperatureUnit,
    pub wind_speed_unit: WindSpeedUnit,
    pub precipitation_unit: PrecipitationUnit,
}

impl ForecastRequest {
    pub fn new(latitude: f64, longitude: f64, units: &UnitDefaults) -> Self {
        Self {
            latitude,
            longitude,
            current: Vec::new(),
            hourly: Vec::new(),
            daily: Vec::new(),
            forecast_days: 7,
            temperature_unit: units.temperature,
            wind_speed_unit: units.wind_speed,
            precipitation_unit: units.precipitation,
        }
    }

    pub fn current(mut self, fields: &[&'static str]) -> Self {
        self.current = fields.to_vec();
        self
    }

    pub fn hourly(mut self, fields: &[&'static str]) -> Self {
        self.hourly = fields.to_vec();
        self
    }

    pub fn daily(mut self, fields: &[&'static str]) -> Self {
        self.daily = fields.to_vec();
        self
    }

    pub fn forecast_days(mut self, days: u32) -> Self {
        self.forecast_days = days;
        self
    }

    pub fn temperature_unit(mut self, unit: TemperatureUnit) -> Self {
        self.temperature_unit = unit;
        self
    }

    pub fn wind_speed_unit(mut self, unit: WindSpeedUnit) -> Self {
        self.wind_speed_unit = unit;
        self
    }

    /// Query string pairs; field groups are sent only when non-empty.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("temperature_unit", self.temperature_unit.to_string()),
            ("wind_speed_unit", self.wind_speed_unit.to_string()),
            ("precipitation_unit", self.precipitation_unit.to_string()),
            ("forecast_days", self.forecast_days.to_string()),
        ];
        for (key, fields) in [
            ("current", &self.current),
            ("hourly", &self.hourly),
            ("daily", &self.daily),
        ] {
            if !fields.is_empty() {
                pairs.push((key, fields.join(",")));
            }
        }
        pairs
    }
}

/// Forecast response keyed by the requested groups, each with a parallel units block.
///
/// Group contents are kept as raw JSON; fields are checked only when a handler reads them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    current: Option<Map<String, Value>>,
    #[serde(default)]
    current_units: Option<Map<String, Value>>,
    #[serde(default)]
    hourly: Option<Map<String, Value>>,
    #[serde(default)]
    hourly_units: Option<Map<String, Value>>,
    #[serde(default)]
    daily: Option<Map<String, Value>>,
    #[serde(default)]
    daily_units: Option<Map<String, Value>>,
}

impl ForecastResponse {
    pub fn current(&self) -> Result<Group<'_>> {
        Group::new("current", self.current.as_ref(), self.current_units.as_ref())
    }

    pub fn hourly(&self) -> Result<Group<'_>> {
        Group::new("hourly", self.hourly.as_ref(), self.hourly_units.as_ref())
    }

    pub fn daily(&self) -> Result<Group<'_>> {
        Group::new("daily", self.daily.as_ref(), self.daily_units.as_ref())
    }
}

/// One field group (`current`, `hourly` or `daily`) of a forecast response.
#[derive(Debug, Clone, Copy)]
pub struct Group<'a> {
    name: &'static str,
    values: &'a Map<String, Value>,
    units: Option<&'a Map<String, Value>>,
}

impl<'a> Group<'a> {
    fn new(
        name: &'static str,
        values: Option<&'a Map<String, Value>>,
        units: Option<&'a Map<String, Value>>,
    ) -> Result<Self> {
        let values = values.ok_or_else(|| Error::shape(format!("response has no '{name}' block")))?;
        Ok(Self { name, values, units })
    }

    fn field(&self, field: &str) -> Result<&'a Value> {
        self.values
            .get(field)
            .ok_or_else(|| Error::shape(format!("missing field '{}.{field}'", self.name)))
    }

    fn column(&self, field: &str, len: usize) -> Result<&'a [Value]> {
        let column = self.field(field)?.as_array().ok_or_else(|| {
            Error::shape(format!("field '{}.{field}' is not an array", self.name))
        })?;
        column.get(..len).ok_or_else(|| {
            Error::shape(format!(
                "field '{}.{field}' has {} entries, expected {len}",
                self.name,
                column.len()
            ))
        })
    }

    pub fn number(&self, field: &str) -> Result<f64> {
        as_number(self.field(field)?).ok_or_else(|| self.not_a("number", field))
    }

    pub fn code(&self, field: &str) -> Result<i64> {
        as_code(self.field(field)?).ok_or_else(|| self.not_a("weather code", field))
    }

    pub fn text(&self, field: &str) -> Result<String> {
        self.field(field)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.not_a("string", field))
    }

    /// Unit label for `field` from the group's parallel units block.
    pub fn unit(&self, field: &str) -> Result<String> {
        self.units
            .and_then(|u| u.get(field))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::shape(format!("missing unit for '{}.{field}'", self.name)))
    }

    /// Number of samples in a series group, taken from its `time` column.
    pub fn len(&self) -> Result<usize> {
        self.field("time")?
            .as_array()
            .map(Vec::len)
            .ok_or_else(|| self.not_a("array", "time"))
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }

    pub fn numbers(&self, field: &str, len: usize) -> Result<Vec<f64>> {
        self.column(field, len)?
            .iter()
            .map(|v| as_number(v).ok_or_else(|| self.not_a("number series", field)))
            .collect()
    }

    pub fn codes(&self, field: &str, len: usize) -> Result<Vec<i64>> {
        self.column(field, len)?
            .iter()
            .map(|v| as_code(v).ok_or_else(|| self.not_a("weather code series", field)))
            .collect()
    }

    pub fn texts(&self, field: &str, len: usize) -> Result<Vec<String>> {
        self.column(field, len)?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.not_a("string series", field))
            })
            .collect()
    }

    fn not_a(&self, what: &str, field: &str) -> Error {
        Error::shape(format!("field '{}.{field}' is not a {what}", self.name))
    }
}

fn as_number(v: &Value) -> Option<f64> {
    v.as_f64()
}

fn as_code(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}
