//! Core library for the `meteo` weather tools.
//!
//! This crate defines:
//! - Configuration handling
//! - Clients for the Open-Meteo geocoding and forecast APIs
//! - Location resolution, including interactive disambiguation through an [`Elicitor`]
//! - The tool handlers and their shared domain models
//!
//! It is used by `meteo-cli`, but any agent host can drive [`WeatherTools`] directly by
//! supplying its own [`Elicitor`].

pub mod alerts;
pub mod config;
pub mod elicitation;
pub mod error;
pub mod model;
pub mod provider;
pub mod resolver;
pub mod tools;
pub mod wmo;

pub use config::Config;
pub use elicitation::{ElicitationOutcome, ElicitationRequest, Elicitor, FixedElicitor, LocationChoice};
pub use error::{Error, Result};
pub use model::{LocationCandidate, ResolvedLocation};
pub use provider::{ForecastProvider, LocationSearch, OpenMeteoClient};
pub use resolver::LocationResolver;
pub use tools::{ToolSpec, WeatherTools};
