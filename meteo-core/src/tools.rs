//! Tool handlers exposed to an agent host.
//!
//! Every handler validates its input, resolves the location (except `search_locations`),
//! performs one forecast request and reshapes the response. A call either returns a
//! complete record or fails.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    alerts::{self, HourSample, LOOKAHEAD_HOURS},
    config::{Config, Limits, UnitDefaults},
    elicitation::Elicitor,
    error::{Error, Result},
    model::{
        AlertReport, CurrentWeather, DailyForecast, HourlyForecast, HourlyWeatherPoint,
        LocationCandidate, ResolvedLocation, TemperatureUnit, WeatherAlert, WeatherForecast,
        WindSpeedUnit,
    },
    provider::{ForecastProvider, ForecastRequest, LocationSearch, OpenMeteoClient},
    resolver::LocationResolver,
    wmo,
};

pub const SEARCH_LOCATIONS: &str = "search_locations";
pub const GET_CURRENT_WEATHER: &str = "get_current_weather";
pub const GET_WEATHER_FORECAST: &str = "get_weather_forecast";
pub const GET_HOURLY_FORECAST: &str = "get_hourly_forecast";
pub const GET_WEATHER_ALERTS: &str = "get_weather_alerts";

const MIN_QUERY_CHARS: usize = 2;

const CURRENT_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "weather_code",
    "wind_speed_10m",
    "wind_direction_10m",
    "pressure_msl",
    "cloud_cover",
];

const DAILY_FIELDS: &[&str] = &[
    "temperature_2m_max",
    "temperature_2m_min",
    "weather_code",
    "precipitation_sum",
    "wind_speed_10m_max",
    "wind_direction_10m_dominant",
];

const HOURLY_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "weather_code",
    "precipitation",
    "wind_speed_10m",
    "wind_direction_10m",
    "cloud_cover",
];

const ALERT_CURRENT_FIELDS: &[&str] =
    &["temperature_2m", "weather_code", "wind_speed_10m", "precipitation"];

const ALERT_HOURLY_FIELDS: &[&str] = &[
    "temperature_2m",
    "weather_code",
    "wind_speed_10m",
    "precipitation",
    "wind_gusts_10m",
];

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchLocationsInput {
    /// Name of city, region, or postal code to search for.
    pub location_name: String,
    /// Maximum number of results to return (1-10).
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CurrentWeatherInput {
    /// Name of the location (city, region, etc.).
    pub location_name: String,
    /// Temperature unit; the configured default when omitted.
    #[serde(default)]
    pub temperature_unit: Option<TemperatureUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WeatherForecastInput {
    /// Name of the location (city, region, etc.).
    pub location_name: String,
    /// Number of forecast days (1-16).
    #[serde(default = "default_forecast_days")]
    pub forecast_days: i64,
    /// Temperature unit; the configured default when omitted.
    #[serde(default)]
    pub temperature_unit: Option<TemperatureUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HourlyForecastInput {
    /// Name of the location (city, region, etc.).
    pub location_name: String,
    /// Number of forecast hours (1-168).
    #[serde(default = "default_forecast_hours")]
    pub forecast_hours: i64,
    /// Temperature unit; the configured default when omitted.
    #[serde(default)]
    pub temperature_unit: Option<TemperatureUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WeatherAlertsInput {
    /// Name of the location (city, region, etc.).
    pub location_name: String,
}

fn default_search_limit() -> i64 {
    5
}

fn default_forecast_days() -> i64 {
    7
}

fn default_forecast_hours() -> i64 {
    24
}

/// Name, description and input schema of one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn spec<T: JsonSchema>(name: &'static str, description: &'static str) -> ToolSpec {
    ToolSpec {
        name,
        description,
        input_schema: serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null),
    }
}

/// The weather tool set, shared across invocations.
#[derive(Debug, Clone)]
pub struct WeatherTools {
    search: Arc<dyn LocationSearch>,
    forecast: Arc<dyn ForecastProvider>,
    limits: Limits,
    units: UnitDefaults,
}

impl WeatherTools {
    pub fn new(
        search: Arc<dyn LocationSearch>,
        forecast: Arc<dyn ForecastProvider>,
        config: &Config,
    ) -> Self {
        Self {
            search,
            forecast,
            limits: config.limits.clone(),
            units: config.units.clone(),
        }
    }

    /// Tool set backed by the Open-Meteo APIs.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = Arc::new(OpenMeteoClient::new(config)?);
        Ok(Self::new(client.clone(), client, config))
    }

    pub fn specs() -> Vec<ToolSpec> {
        vec![
            spec::<SearchLocationsInput>(
                SEARCH_LOCATIONS,
                "Search for locations by name or postal code.",
            ),
            spec::<CurrentWeatherInput>(
                GET_CURRENT_WEATHER,
                "Get current weather conditions for a location.",
            ),
            spec::<WeatherForecastInput>(
                GET_WEATHER_FORECAST,
                "Get daily weather forecast for a location.",
            ),
            spec::<HourlyForecastInput>(
                GET_HOURLY_FORECAST,
                "Get hourly weather forecast for a location.",
            ),
            spec::<WeatherAlertsInput>(
                GET_WEATHER_ALERTS,
                "Check for severe weather conditions and alerts for a location.",
            ),
        ]
    }

    /// Dispatch a tool call by name with JSON arguments.
    pub async fn call(&self, name: &str, args: Value, elicitor: &dyn Elicitor) -> Result<Value> {
        info!(tool = name, "tool called");
        self.dispatch(name, args, elicitor)
            .await
            .inspect_err(|e| error!(tool = name, error = %e, "tool call failed"))
    }

    async fn dispatch(&self, name: &str, args: Value, elicitor: &dyn Elicitor) -> Result<Value> {
        match name {
            SEARCH_LOCATIONS => to_json(self.search_locations(parse(name, args)?).await?),
            GET_CURRENT_WEATHER => {
                to_json(self.current_weather(parse(name, args)?, elicitor).await?)
            }
            GET_WEATHER_FORECAST => {
                to_json(self.weather_forecast(parse(name, args)?, elicitor).await?)
            }
            GET_HOURLY_FORECAST => {
                to_json(self.hourly_forecast(parse(name, args)?, elicitor).await?)
            }
            GET_WEATHER_ALERTS => to_json(self.weather_alerts(parse(name, args)?, elicitor).await?),
            other => Err(Error::UnknownTool(other.to_string())),
        }
    }

    fn resolver(&self) -> LocationResolver<'_> {
        LocationResolver::new(self.search.as_ref(), &self.limits)
    }

    pub async fn search_locations(&self, input: SearchLocationsInput) -> Result<Vec<LocationCandidate>> {
        let query = validate_query(&input.location_name)?;
        let limit = clamp(input.limit, self.limits.max_search_results as u32, "limit") as usize;

        let locations = self.search.search(query, limit).await?;
        info!(query, results = locations.len(), "search_locations done");
        Ok(locations)
    }

    pub async fn current_weather(
        &self,
        input: CurrentWeatherInput,
        elicitor: &dyn Elicitor,
    ) -> Result<CurrentWeather> {
        let query = validate_query(&input.location_name)?;
        let location = self.resolver().resolve(query, elicitor).await?;

        let request = self
            .request_for(&location)
            .current(CURRENT_FIELDS)
            .temperature_unit(input.temperature_unit.unwrap_or(self.units.temperature));
        let data = self.forecast.forecast(&request).await?;

        let shaped = (|| -> Result<CurrentWeather> {
            let current = data.current()?;
            let code = current.code("weather_code")?;
            Ok(CurrentWeather {
                temperature: current.number("temperature_2m")?,
                temperature_unit: current.unit("temperature_2m")?,
                humidity: current.number("relative_humidity_2m")?,
                weather_description: wmo::describe(code),
                weather_code: code,
                wind_speed: current.number("wind_speed_10m")?,
                wind_direction: current.number("wind_direction_10m")?,
                wind_speed_unit: current.unit("wind_speed_10m")?,
                pressure: current.number("pressure_msl")?,
                cloud_cover: current.number("cloud_cover")?,
                timestamp: current.text("time")?,
                location: location.clone(),
            })
        })();

        let result = shaped.inspect_err(|e| shape_failed(&location, e))?;
        info!(
            name = %location.name,
            temperature = result.temperature,
            conditions = %result.weather_description,
            "current weather"
        );
        Ok(result)
    }

    pub async fn weather_forecast(
        &self,
        input: WeatherForecastInput,
        elicitor: &dyn Elicitor,
    ) -> Result<WeatherForecast> {
        let query = validate_query(&input.location_name)?;
        let location = self.resolver().resolve(query, elicitor).await?;
        let days = clamp(input.forecast_days, self.limits.max_forecast_days, "forecast_days");

        let request = self
            .request_for(&location)
            .daily(DAILY_FIELDS)
            .forecast_days(days)
            .temperature_unit(input.temperature_unit.unwrap_or(self.units.temperature));
        let data = self.forecast.forecast(&request).await?;

        let shaped = (|| -> Result<Vec<DailyForecast>> {
            let daily = data.daily()?;
            let n = daily.len()?;
            let dates = daily.texts("time", n)?;
            let max = daily.numbers("temperature_2m_max", n)?;
            let min = daily.numbers("temperature_2m_min", n)?;
            let codes = daily.codes("weather_code", n)?;
            let precipitation = daily.numbers("precipitation_sum", n)?;
            let wind = daily.numbers("wind_speed_10m_max", n)?;
            let direction = daily.numbers("wind_direction_10m_dominant", n)?;
            let temperature_unit = daily.unit("temperature_2m_max")?;
            let precipitation_unit = daily.unit("precipitation_sum")?;
            let wind_speed_unit = daily.unit("wind_speed_10m_max")?;

            let days = (0..n)
                .map(|i| DailyForecast {
                    date: dates[i].clone(),
                    temperature_max: max[i],
                    temperature_min: min[i],
                    temperature_unit: temperature_unit.clone(),
                    weather_description: wmo::describe(codes[i]),
                    weather_code: codes[i],
                    precipitation_sum: precipitation[i],
                    precipitation_unit: precipitation_unit.clone(),
                    wind_speed_max: wind[i],
                    wind_direction_dominant: direction[i],
                    wind_speed_unit: wind_speed_unit.clone(),
                })
                .collect::<Vec<_>>();
            Ok(days)
        })();

        let forecast_days = shaped.inspect_err(|e| shape_failed(&location, e))?;
        info!(name = %location.name, days = forecast_days.len(), "daily forecast");
        Ok(WeatherForecast { location, forecast_days, generated_at: Utc::now() })
    }

    pub async fn hourly_forecast(
        &self,
        input: HourlyForecastInput,
        elicitor: &dyn Elicitor,
    ) -> Result<HourlyForecast> {
        let query = validate_query(&input.location_name)?;
        let location = self.resolver().resolve(query, elicitor).await?;
        let hours = clamp(input.forecast_hours, self.limits.max_forecast_hours, "forecast_hours");

        let request = self
            .request_for(&location)
            .hourly(HOURLY_FIELDS)
            .forecast_days(hours.div_ceil(24))
            .temperature_unit(input.temperature_unit.unwrap_or(self.units.temperature));
        let data = self.forecast.forecast(&request).await?;

        let shaped = (|| -> Result<HourlyForecast> {
            let hourly = data.hourly()?;
            let n = hourly.len()?.min(hours as usize);
            debug!(hours = n, "shaping hourly samples");
            let times = hourly.texts("time", n)?;
            let temperature = hourly.numbers("temperature_2m", n)?;
            let humidity = hourly.numbers("relative_humidity_2m", n)?;
            let codes = hourly.codes("weather_code", n)?;
            let precipitation = hourly.numbers("precipitation", n)?;
            let wind = hourly.numbers("wind_speed_10m", n)?;
            let direction = hourly.numbers("wind_direction_10m", n)?;
            let cloud = hourly.numbers("cloud_cover", n)?;

            let points = (0..n)
                .map(|i| HourlyWeatherPoint {
                    time: times[i].clone(),
                    temperature: temperature[i],
                    humidity: humidity[i],
                    weather_code: codes[i],
                    weather_description: wmo::describe(codes[i]),
                    precipitation: precipitation[i],
                    wind_speed: wind[i],
                    wind_direction: direction[i],
                    cloud_cover: cloud[i],
                })
                .collect::<Vec<_>>();

            Ok(HourlyForecast {
                location: location.clone(),
                hourly_data: points,
                temperature_unit: hourly.unit("temperature_2m")?,
                precipitation_unit: hourly.unit("precipitation")?,
                wind_speed_unit: hourly.unit("wind_speed_10m")?,
                generated_at: Utc::now(),
            })
        })();

        let forecast = shaped.inspect_err(|e| shape_failed(&location, e))?;
        info!(name = %location.name, hours = forecast.hourly_data.len(), "hourly forecast");
        Ok(forecast)
    }

    pub async fn weather_alerts(
        &self,
        input: WeatherAlertsInput,
        elicitor: &dyn Elicitor,
    ) -> Result<AlertReport> {
        let query = validate_query(&input.location_name)?;
        let location = self.resolver().resolve(query, elicitor).await?;

        // The wind threshold is in km/h regardless of the configured default.
        let request = self
            .request_for(&location)
            .current(ALERT_CURRENT_FIELDS)
            .hourly(ALERT_HOURLY_FIELDS)
            .wind_speed_unit(WindSpeedUnit::Kmh)
            .forecast_days(2);
        let data = self.forecast.forecast(&request).await?;

        let shaped = (|| -> Result<Vec<WeatherAlert>> {
            let current = data.current()?;
            let code = current.code("weather_code")?;
            let wind = current.number("wind_speed_10m")?;

            let hourly = data.hourly()?;
            let n = hourly.len()?.min(LOOKAHEAD_HOURS);
            let upcoming = hourly
                .texts("time", n)?
                .into_iter()
                .zip(hourly.codes("weather_code", n)?)
                .map(|(time, weather_code)| HourSample { time, weather_code })
                .collect::<Vec<_>>();

            Ok(alerts::evaluate(code, wind, &upcoming, self.limits.high_wind_threshold_kmh))
        })();

        let alerts = shaped.inspect_err(|e| shape_failed(&location, e))?;
        info!(name = %location.name, alerts = alerts.len(), "weather alerts checked");
        Ok(AlertReport {
            location,
            alert_count: alerts.len(),
            alerts,
            checked_at: Utc::now(),
        })
    }

    fn request_for(&self, location: &ResolvedLocation) -> ForecastRequest {
        debug!(
            latitude = location.latitude,
            longitude = location.longitude,
            "building forecast request"
        );
        ForecastRequest::new(location.latitude, location.longitude, &self.units)
    }
}

fn validate_query(raw: &str) -> Result<&str> {
    let query = raw.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        error!(query = raw, "location name too short");
        return Err(Error::InvalidInput(format!(
            "Location name must be at least {MIN_QUERY_CHARS} characters long."
        )));
    }
    Ok(query)
}

/// Clamp a requested count into `1..=max`.
fn clamp(requested: i64, max: u32, what: &str) -> u32 {
    let clamped = requested.clamp(1, i64::from(max.max(1))) as u32;
    if i64::from(clamped) != requested {
        debug!(what, requested, clamped, "clamped out-of-range count");
    }
    clamped
}

fn shape_failed(location: &ResolvedLocation, e: &Error) {
    error!(
        latitude = location.latitude,
        longitude = location.longitude,
        error = %e,
        "failed to shape forecast response"
    );
}

fn parse<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    let args = if args.is_null() { Value::Object(Default::default()) } else { args };
    serde_json::from_value(args)
        .map_err(|e| Error::InvalidInput(format!("invalid arguments for {tool}: {e}")))
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::shape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        elicitation::ElicitationOutcome,
        model::Severity,
        provider::ForecastResponse,
        resolver::tests::{FakeSearch, RecordingElicitor, candidate},
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct FakeForecast {
        response: Value,
        failure: Option<&'static str>,
        requests: Mutex<Vec<ForecastRequest>>,
    }

    impl FakeForecast {
        fn new(response: Value) -> Self {
            Self { response, failure: None, requests: Mutex::new(Vec::new()) }
        }

        fn failing(message: &'static str) -> Self {
            Self { failure: Some(message), ..Self::new(Value::Null) }
        }

        fn last_request(&self) -> ForecastRequest {
            self.requests.lock().unwrap().last().cloned().expect("a forecast request")
        }
    }

    #[async_trait]
    impl ForecastProvider for FakeForecast {
        async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(message) = self.failure {
                return Err(Error::upstream("Weather", message));
            }
            Ok(serde_json::from_value(self.response.clone()).unwrap())
        }
    }

    fn tools(search: FakeSearch, forecast: Arc<FakeForecast>) -> WeatherTools {
        WeatherTools::new(Arc::new(search), forecast, &Config::default())
    }

    fn berlin() -> FakeSearch {
        FakeSearch::with(vec![candidate(2950159, "Berlin", Some("Land Berlin"), 52.52)])
    }

    fn daily_response(days: usize) -> Value {
        let dates: Vec<String> = (0..days).map(|i| format!("2024-07-{:02}", i + 1)).collect();
        json!({
            "daily": {
                "time": dates,
                "temperature_2m_max": vec![25.0; days],
                "temperature_2m_min": vec![14.0; days],
                "weather_code": vec![2; days],
                "precipitation_sum": vec![0.4; days],
                "wind_speed_10m_max": vec![18.0; days],
                "wind_direction_10m_dominant": vec![270; days]
            },
            "daily_units": {
                "temperature_2m_max": "°C",
                "precipitation_sum": "mm",
                "wind_speed_10m_max": "km/h"
            }
        })
    }

    fn hourly_response(hours: usize, codes: &[i64]) -> Value {
        let mut weather_code = vec![0i64; hours];
        weather_code[..codes.len()].copy_from_slice(codes);
        let times: Vec<String> = (0..hours).map(|i| format!("2024-07-01T{:02}:00", i % 24)).collect();
        json!({
            "current": { "time": "2024-07-01T00:00", "temperature_2m": 21.0, "weather_code": 0, "wind_speed_10m": 10.0, "precipitation": 0.0 },
            "current_units": { "wind_speed_10m": "km/h" },
            "hourly": {
                "time": times,
                "temperature_2m": vec![20.0; hours],
                "relative_humidity_2m": vec![60; hours],
                "weather_code": weather_code,
                "precipitation": vec![0.0; hours],
                "wind_speed_10m": vec![9.5; hours],
                "wind_direction_10m": vec![180; hours],
                "cloud_cover": vec![40; hours]
            },
            "hourly_units": { "temperature_2m": "°C", "precipitation": "mm", "wind_speed_10m": "km/h" }
        })
    }

    #[tokio::test]
    async fn current_weather_shapes_fields_and_units() {
        let forecast = Arc::new(FakeForecast::new(json!({
            "current": {
                "time": "2024-07-01T12:00",
                "temperature_2m": 77.0,
                "relative_humidity_2m": 40,
                "weather_code": 1,
                "wind_speed_10m": 12.3,
                "wind_direction_10m": 250,
                "pressure_msl": 1013.2,
                "cloud_cover": 20
            },
            "current_units": { "temperature_2m": "°F", "wind_speed_10m": "km/h" }
        })));
        let tools = tools(berlin(), forecast.clone());
        let input = CurrentWeatherInput {
            location_name: "Berlin".into(),
            temperature_unit: Some(TemperatureUnit::Fahrenheit),
        };

        let out = tools.current_weather(input, &RecordingElicitor::choosing(1)).await.unwrap();

        assert_eq!(out.location.name, "Berlin");
        assert_eq!(out.temperature, 77.0);
        assert_eq!(out.temperature_unit, "°F");
        assert_eq!(out.weather_description, "Mainly clear");
        assert_eq!(out.timestamp, "2024-07-01T12:00");

        let req = forecast.last_request();
        assert_eq!(req.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(req.current, CURRENT_FIELDS.to_vec());
        assert_eq!(req.latitude, 52.52);
    }

    #[tokio::test]
    async fn missing_current_field_is_a_shape_error() {
        let forecast = Arc::new(FakeForecast::new(json!({
            "current": { "time": "2024-07-01T12:00", "weather_code": 1 },
            "current_units": {}
        })));
        let tools = tools(berlin(), forecast);
        let input = CurrentWeatherInput { location_name: "Berlin".into(), temperature_unit: None };

        let err = tools.current_weather(input, &RecordingElicitor::choosing(1)).await.unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[tokio::test]
    async fn forecast_days_are_clamped_to_maximum() {
        let forecast = Arc::new(FakeForecast::new(daily_response(16)));
        let tools = tools(berlin(), forecast.clone());
        let input = WeatherForecastInput {
            location_name: "Berlin".into(),
            forecast_days: 30,
            temperature_unit: None,
        };

        let out = tools.weather_forecast(input, &RecordingElicitor::choosing(1)).await.unwrap();

        assert_eq!(forecast.last_request().forecast_days, 16);
        assert_eq!(out.forecast_days.len(), 16);
        assert_eq!(out.forecast_days[0].date, "2024-07-01");
        assert_eq!(out.forecast_days[0].weather_description, "Partly cloudy");
        assert_eq!(out.forecast_days[0].wind_speed_unit, "km/h");
    }

    #[tokio::test]
    async fn non_positive_forecast_days_clamp_to_one() {
        let forecast = Arc::new(FakeForecast::new(daily_response(1)));
        let tools = tools(berlin(), forecast.clone());
        let input = WeatherForecastInput {
            location_name: "Berlin".into(),
            forecast_days: -3,
            temperature_unit: None,
        };

        tools.weather_forecast(input, &RecordingElicitor::choosing(1)).await.unwrap();
        assert_eq!(forecast.last_request().forecast_days, 1);
    }

    #[tokio::test]
    async fn hourly_forecast_truncates_to_requested_hours() {
        let forecast = Arc::new(FakeForecast::new(hourly_response(48, &[])));
        let tools = tools(berlin(), forecast.clone());
        let input = HourlyForecastInput {
            location_name: "Berlin".into(),
            forecast_hours: 30,
            temperature_unit: None,
        };

        let out = tools.hourly_forecast(input, &RecordingElicitor::choosing(1)).await.unwrap();

        assert_eq!(out.hourly_data.len(), 30);
        assert_eq!(forecast.last_request().forecast_days, 2);
        assert_eq!(out.precipitation_unit, "mm");
    }

    #[tokio::test]
    async fn hourly_forecast_hours_clamp_to_maximum() {
        let forecast = Arc::new(FakeForecast::new(hourly_response(168, &[])));
        let tools = tools(berlin(), forecast.clone());
        let input = HourlyForecastInput {
            location_name: "Berlin".into(),
            forecast_hours: 500,
            temperature_unit: None,
        };

        let out = tools.hourly_forecast(input, &RecordingElicitor::choosing(1)).await.unwrap();

        assert_eq!(out.hourly_data.len(), 168);
        assert_eq!(forecast.last_request().forecast_days, 7);
    }

    #[tokio::test]
    async fn alerts_force_kmh_and_report_incoming_storm() {
        let forecast = Arc::new(FakeForecast::new(hourly_response(48, &[0, 0, 0, 95])));
        let tools = tools(berlin(), forecast.clone());
        let input = WeatherAlertsInput { location_name: "Berlin".into() };

        let report = tools.weather_alerts(input, &RecordingElicitor::choosing(1)).await.unwrap();

        assert_eq!(report.alert_count, 1);
        assert_eq!(report.alerts[0].title, "Incoming Thunderstorm");
        assert_eq!(report.alerts[0].severity, Severity::Medium);
        assert_eq!(report.alerts[0].time, "2024-07-01T03:00");

        let req = forecast.last_request();
        assert_eq!(req.wind_speed_unit, WindSpeedUnit::Kmh);
        assert_eq!(req.forecast_days, 2);
        assert!(req.hourly.contains(&"wind_gusts_10m"));
    }

    #[tokio::test]
    async fn upstream_failure_is_returned_unchanged() {
        let forecast = Arc::new(FakeForecast::failing("HTTP 502: bad gateway"));
        let tools = tools(berlin(), forecast.clone());
        let input = WeatherAlertsInput { location_name: "Berlin".into() };

        let err = tools.weather_alerts(input, &RecordingElicitor::choosing(1)).await.unwrap_err();

        match err {
            Error::Upstream { service, message } => {
                assert_eq!(service, "Weather");
                assert_eq!(message, "HTTP 502: bad gateway");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert_eq!(forecast.requests.lock().unwrap().len(), 1);

        let err = tools
            .call(GET_CURRENT_WEATHER, json!({ "location_name": "Berlin" }), &RecordingElicitor::choosing(1))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Weather API error: HTTP 502"));
    }

    #[tokio::test]
    async fn short_query_is_rejected_before_any_request() {
        let search = FakeSearch::with(vec![candidate(1, "X", None, 0.0)]);
        let forecast = Arc::new(FakeForecast::new(json!({})));
        let tools = tools(search, forecast.clone());
        let input = WeatherAlertsInput { location_name: " x ".into() };

        let err = tools.weather_alerts(input, &RecordingElicitor::choosing(1)).await.unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(forecast.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn declined_selection_fails_without_forecast_request() {
        let search = FakeSearch::with(vec![
            candidate(1, "Portland", Some("Oregon"), 45.5),
            candidate(2, "Portland", Some("Maine"), 43.6),
        ]);
        let forecast = Arc::new(FakeForecast::new(daily_response(7)));
        let tools = tools(search, forecast.clone());
        let input = WeatherForecastInput {
            location_name: "Portland".into(),
            forecast_days: 7,
            temperature_unit: None,
        };

        let elicitor = RecordingElicitor::new(ElicitationOutcome::Decline);
        let err = tools.weather_forecast(input, &elicitor).await.unwrap_err();

        assert!(matches!(err, Error::Selection(_)));
        assert!(forecast.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_tool_clamps_limit_and_skips_elicitation() {
        let search = FakeSearch::with((1..=12).map(|i| candidate(i, "Sal", None, 0.0)).collect());
        let forecast = Arc::new(FakeForecast::new(json!({})));
        let tools = tools(search, forecast);

        let out = tools
            .search_locations(SearchLocationsInput { location_name: "Sal".into(), limit: 50 })
            .await
            .unwrap();
        assert_eq!(out.len(), 10);
    }

    #[tokio::test]
    async fn call_dispatches_by_name_with_defaults() {
        let forecast = Arc::new(FakeForecast::new(daily_response(7)));
        let tools = tools(berlin(), forecast.clone());

        let out = tools
            .call(GET_WEATHER_FORECAST, json!({ "location_name": "Berlin" }), &RecordingElicitor::choosing(1))
            .await
            .unwrap();

        assert_eq!(out["location"]["name"], "Berlin");
        assert_eq!(out["forecast_days"].as_array().unwrap().len(), 7);
        assert_eq!(forecast.last_request().forecast_days, 7);
    }

    #[tokio::test]
    async fn call_rejects_unknown_tools_and_bad_arguments() {
        let tools = tools(berlin(), Arc::new(FakeForecast::new(json!({}))));
        let elicitor = RecordingElicitor::choosing(1);

        let err = tools.call("get_tides", json!({}), &elicitor).await.unwrap_err();
        assert!(matches!(err, Error::UnknownTool(ref n) if n == "get_tides"));

        let err = tools.call(GET_CURRENT_WEATHER, Value::Null, &elicitor).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn specs_describe_every_tool() {
        let specs = WeatherTools::specs();
        let names: Vec<_> = specs.iter().map(|s| s.name).collect();

        assert_eq!(
            names,
            vec![
                SEARCH_LOCATIONS,
                GET_CURRENT_WEATHER,
                GET_WEATHER_FORECAST,
                GET_HOURLY_FORECAST,
                GET_WEATHER_ALERTS
            ]
        );
        for spec in &specs {
            assert_eq!(spec.input_schema["required"], json!(["location_name"]), "{}", spec.name);
        }
    }
}
