use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use inquire::{CustomType, Select};
use meteo_core::{
    Config, Elicitor, FixedElicitor, WeatherTools,
    model::{PrecipitationUnit, TemperatureUnit, WindSpeedUnit},
    tools::{
        CurrentWeatherInput, HourlyForecastInput, SearchLocationsInput, WeatherAlertsInput,
        WeatherForecastInput,
    },
};
use serde::Serialize;
use serde_json::Value;

use crate::{output, prompt::TerminalElicitor};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Weather and location tools")]
pub struct Cli {
    /// Answer location disambiguation with this option number instead of prompting.
    #[arg(long, global = true)]
    pub choice: Option<i64>,

    /// Print structured JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log more (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search for locations by name or postal code.
    Search {
        query: String,

        #[arg(long, default_value_t = 5)]
        limit: i64,
    },

    /// Current conditions for a location.
    Current {
        query: String,

        /// "celsius" or "fahrenheit"; the configured default if absent.
        #[arg(long)]
        unit: Option<String>,
    },

    /// Daily forecast for a location.
    Forecast {
        query: String,

        #[arg(long, default_value_t = 7)]
        days: i64,

        #[arg(long)]
        unit: Option<String>,
    },

    /// Hourly forecast for a location.
    Hourly {
        query: String,

        #[arg(long, default_value_t = 24)]
        hours: i64,

        #[arg(long)]
        unit: Option<String>,
    },

    /// Severe weather alerts for a location.
    Alerts { query: String },

    /// Print the tool specifications as JSON.
    Tools,

    /// Invoke a tool by name with JSON arguments and print its JSON result.
    Call {
        tool: String,

        /// JSON object with the tool arguments.
        args: Option<String>,
    },

    /// Interactively edit default units and limits.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        let elicitor: Box<dyn Elicitor> = match self.choice {
            Some(n) => Box::new(FixedElicitor::choose(n)),
            None => Box::new(TerminalElicitor),
        };
        let elicitor = elicitor.as_ref();
        let json = self.json;

        match self.command {
            Command::Configure => configure(config)?,
            Command::Tools => print_json(&WeatherTools::specs())?,
            Command::Call { tool, args } => {
                let args: Value = match args {
                    Some(raw) => serde_json::from_str(&raw).context("Tool arguments must be JSON")?,
                    None => Value::Null,
                };
                let tools = WeatherTools::from_config(&config)?;
                print_json(&tools.call(&tool, args, elicitor).await?)?;
            }
            Command::Search { query, limit } => {
                let tools = WeatherTools::from_config(&config)?;
                let results = tools
                    .search_locations(SearchLocationsInput { location_name: query, limit })
                    .await?;
                show(json, &results[..], output::search)?;
            }
            Command::Current { query, unit } => {
                let tools = WeatherTools::from_config(&config)?;
                let input = CurrentWeatherInput {
                    location_name: query,
                    temperature_unit: parse_unit(unit.as_deref())?,
                };
                let weather = tools.current_weather(input, elicitor).await?;
                show(json, &weather, output::current)?;
            }
            Command::Forecast { query, days, unit } => {
                let tools = WeatherTools::from_config(&config)?;
                let input = WeatherForecastInput {
                    location_name: query,
                    forecast_days: days,
                    temperature_unit: parse_unit(unit.as_deref())?,
                };
                let forecast = tools.weather_forecast(input, elicitor).await?;
                show(json, &forecast, output::daily)?;
            }
            Command::Hourly { query, hours, unit } => {
                let tools = WeatherTools::from_config(&config)?;
                let input = HourlyForecastInput {
                    location_name: query,
                    forecast_hours: hours,
                    temperature_unit: parse_unit(unit.as_deref())?,
                };
                let forecast = tools.hourly_forecast(input, elicitor).await?;
                show(json, &forecast, output::hourly)?;
            }
            Command::Alerts { query } => {
                let tools = WeatherTools::from_config(&config)?;
                let report = tools
                    .weather_alerts(WeatherAlertsInput { location_name: query }, elicitor)
                    .await?;
                show(json, &report, output::alerts)?;
            }
        }

        Ok(())
    }
}

fn show<T: Serialize + ?Sized>(json: bool, value: &T, render: fn(&T) -> String) -> anyhow::Result<()> {
    if json {
        print_json(value)
    } else {
        println!("{}", render(value));
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_unit(raw: Option<&str>) -> anyhow::Result<Option<TemperatureUnit>> {
    raw.map(TemperatureUnit::try_from).transpose()
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    config.units.temperature =
        Select::new("Default temperature unit:", TemperatureUnit::all().to_vec())
            .with_starting_cursor(index_of(TemperatureUnit::all(), config.units.temperature))
            .prompt()?;
    config.units.wind_speed = Select::new("Default wind speed unit:", WindSpeedUnit::all().to_vec())
        .with_starting_cursor(index_of(WindSpeedUnit::all(), config.units.wind_speed))
        .prompt()?;
    config.units.precipitation =
        Select::new("Default precipitation unit:", PrecipitationUnit::all().to_vec())
            .with_starting_cursor(index_of(PrecipitationUnit::all(), config.units.precipitation))
            .prompt()?;

    config.limits.max_elicitation_options =
        CustomType::<usize>::new("Locations offered when a name is ambiguous:")
            .with_default(config.limits.max_elicitation_options)
            .prompt()?;
    config.limits.high_wind_threshold_kmh =
        CustomType::<f64>::new("High wind threshold (km/h):")
            .with_default(config.limits.high_wind_threshold_kmh)
            .prompt()?;

    config.validate()?;
    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn index_of<T: PartialEq>(all: &[T], current: T) -> usize {
    all.iter().position(|u| *u == current).unwrap_or(0)
}
