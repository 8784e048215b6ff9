use anyhow::Result as AnyResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::{
    config::Config,
    error::Result,
    model::LocationCandidate,
};

use super::{ForecastProvider, ForecastRequest, ForecastResponse, LocationSearch, http};

const GEOCODING: &str = "Geocoding";
const WEATHER: &str = "Weather";

/// Client for the Open-Meteo geocoding and forecast APIs.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    geocoding_url: String,
    forecast_url: String,
    max_search_results: usize,
}

impl OpenMeteoClient {
    pub fn new(config: &Config) -> AnyResult<Self> {
        Ok(Self {
            http: http::build_client(&config.api)?,
            geocoding_url: config.api.geocoding_url.clone(),
            forecast_url: config.api.forecast_url.clone(),
            max_search_results: config.limits.max_search_results,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    // Absent when nothing matched.
    #[serde(default)]
    results: Vec<LocationCandidate>,
}

#[async_trait]
impl LocationSearch for OpenMeteoClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<LocationCandidate>> {
        let count = limit.min(self.max_search_results);
        info!(query, count, "searching locations");

        let parsed: GeocodingResponse = http::get_json(
            &self.http,
            GEOCODING,
            &self.geocoding_url,
            &[
                ("name", query.to_string()),
                ("count", count.to_string()),
                ("format", "json".to_string()),
            ],
        )
        .await
        .inspect_err(|e| error!(query, error = %e, "location search failed"))?;

        info!(query, results = parsed.results.len(), "geocoding returned");
        Ok(parsed.results)
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        info!(
            latitude = request.latitude,
            longitude = request.longitude,
            "requesting forecast"
        );

        let data: ForecastResponse = http::get_json(
            &self.http,
            WEATHER,
            &self.forecast_url,
            &request.query_pairs(),
        )
        .await
        .inspect_err(|e| {
            error!(
                latitude = request.latitude,
                longitude = request.longitude,
                error = %e,
                "forecast request failed"
            )
        })?;

        debug!(timezone = ?data.timezone, "forecast received");
        Ok(data)
    }
}
