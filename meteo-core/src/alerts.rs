//! Rule table turning current conditions and the next hours into advisory entries.

use tracing::{debug, warn};

use crate::{
    model::{AlertKind, Severity, WeatherAlert},
    wmo::{self, FREEZING_RAIN_CODES, SNOW_CODES},
};

/// How many hourly samples are scanned for an incoming thunderstorm.
pub const LOOKAHEAD_HOURS: usize = 24;

/// One hourly sample considered by the upcoming-storm scan.
#[derive(Debug, Clone, PartialEq)]
pub struct HourSample {
    pub time: String,
    pub weather_code: i64,
}

/// Apply the alert rules.
///
/// At most one current-code alert is raised (thunderstorm, then freezing rain, then snow).
/// Wind above `high_wind_threshold_kmh` always adds a wind warning. The first thunderstorm
/// sample within [`LOOKAHEAD_HOURS`] adds an incoming-storm alert unless a severe-weather
/// alert already exists.
pub fn evaluate(
    current_code: i64,
    current_wind_kmh: f64,
    upcoming: &[HourSample],
    high_wind_threshold_kmh: f64,
) -> Vec<WeatherAlert> {
    let mut alerts = Vec::new();

    if wmo::is_thunderstorm(current_code) {
        warn!(code = current_code, "thunderstorm in progress");
        alerts.push(current_alert(
            AlertKind::SevereWeather,
            Severity::High,
            "Thunderstorm Warning",
            current_code,
        ));
    } else if FREEZING_RAIN_CODES.contains(&current_code) {
        warn!(code = current_code, "freezing rain in progress");
        alerts.push(current_alert(
            AlertKind::SevereWeather,
            Severity::High,
            "Freezing Rain Warning",
            current_code,
        ));
    } else if SNOW_CODES.contains(&current_code) {
        debug!(code = current_code, "snow in progress");
        alerts.push(current_alert(
            AlertKind::WeatherAdvisory,
            Severity::Medium,
            "Snow Advisory",
            current_code,
        ));
    }

    if current_wind_kmh > high_wind_threshold_kmh {
        warn!(wind_kmh = current_wind_kmh, threshold = high_wind_threshold_kmh, "high winds");
        alerts.push(WeatherAlert {
            kind: AlertKind::WindWarning,
            severity: Severity::Medium,
            title: "High Wind Warning".to_string(),
            description: format!("Strong winds at {current_wind_kmh:?} km/h"),
            time: "current".to_string(),
        });
    }

    let severe_already = alerts.iter().any(|a| a.kind == AlertKind::SevereWeather);
    let incoming = if severe_already {
        None
    } else {
        upcoming
            .iter()
            .take(LOOKAHEAD_HOURS)
            .find(|h| wmo::is_thunderstorm(h.weather_code))
    };
    if let Some(hour) = incoming {
        warn!(time = %hour.time, code = hour.weather_code, "thunderstorm expected");
        alerts.push(WeatherAlert {
            kind: AlertKind::SevereWeather,
            severity: Severity::Medium,
            title: "Incoming Thunderstorm".to_string(),
            description: format!("Thunderstorm expected at {}", hour.time),
            time: hour.time.clone(),
        });
    }

    alerts
}

fn current_alert(kind: AlertKind, severity: Severity, title: &str, code: i64) -> WeatherAlert {
    WeatherAlert {
        kind,
        severity,
        title: title.to_string(),
        description: wmo::describe(code),
        time: "current".to_string(),
    }
}
