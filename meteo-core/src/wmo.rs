//! WMO weather interpretation codes as reported by Open-Meteo.

pub const THUNDERSTORM_CODES: &[i64] = &[95, 96, 99];
pub const FREEZING_RAIN_CODES: &[i64] = &[66, 67];
pub const SNOW_CODES: &[i64] = &[71, 73, 75, 77, 85, 86];

pub fn describe(code: i64) -> String {
    let text = match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        other => return format!("Unknown weather code ({other})"),
    };
    text.to_string()
}

pub fn is_thunderstorm(code: i64) -> bool {
    THUNDERSTORM_CODES.contains(&code)
}
