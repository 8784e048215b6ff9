//! Human-friendly rendering of tool results.

use chrono::{DateTime, Local, Utc};
use meteo_core::{
    LocationCandidate, ResolvedLocation,
    model::{AlertReport, CurrentWeather, HourlyForecast, WeatherForecast},
    resolver::option_line,
};

fn place(loc: &ResolvedLocation) -> String {
    let mut parts = vec![loc.name.as_str()];
    if let Some(admin1) = loc.admin1.as_deref() {
        parts.push(admin1);
    }
    if !loc.country.is_empty() {
        parts.push(loc.country.as_str());
    }
    format!(
        "{} ({:.4}, {:.4}, {})",
        parts.join(", "),
        loc.latitude,
        loc.longitude,
        loc.timezone
    )
}

fn local(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn search(results: &[LocationCandidate]) -> String {
    if results.is_empty() {
        return "No locations found.".to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}  [{:.4}, {:.4}]", option_line(i + 1, c), c.latitude, c.longitude))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn current(w: &CurrentWeather) -> String {
    format!(
        "{}\n  as of {}\n  {}, {}{}\n  humidity {}%, cloud cover {}%\n  wind {} {} from {}°\n  pressure {} hPa",
        place(&w.location),
        w.timestamp,
        w.weather_description,
        w.temperature,
        w.temperature_unit,
        w.humidity,
        w.cloud_cover,
        w.wind_speed,
        w.wind_speed_unit,
        w.wind_direction,
        w.pressure,
    )
}

pub fn daily(f: &WeatherForecast) -> String {
    let mut out = vec![place(&f.location)];
    for d in &f.forecast_days {
        out.push(format!(
            "  {}  {}..{}{}  {}  precip {}{}  wind {} {}",
            d.date,
            d.temperature_min,
            d.temperature_max,
            d.temperature_unit,
            d.weather_description,
            d.precipitation_sum,
            d.precipitation_unit,
            d.wind_speed_max,
            d.wind_speed_unit,
        ));
    }
    out.push(format!("generated {}", local(&f.generated_at)));
    out.join("\n")
}

pub fn hourly(f: &HourlyForecast) -> String {
    let mut out = vec![place(&f.location)];
    for h in &f.hourly_data {
        out.push(format!(
            "  {}  {}{}  {}  precip {}{}  wind {} {}",
            h.time,
            h.temperature,
            f.temperature_unit,
            h.weather_description,
            h.precipitation,
            f.precipitation_unit,
            h.wind_speed,
            f.wind_speed_unit,
        ));
    }
    out.push(format!("generated {}", local(&f.generated_at)));
    out.join("\n")
}

pub fn alerts(r: &AlertReport) -> String {
    let mut out = vec![place(&r.location)];
    if r.alerts.is_empty() {
        out.push("  No weather alerts.".to_string());
    }
    for a in &r.alerts {
        out.push(format!(
            "  [{:?}] {} ({}): {}",
            a.severity, a.title, a.time, a.description
        ));
    }
    out.push(format!("checked {}", local(&r.checked_at)));
    out.join("\n")
}
