//! Outbound GET with uniform failure translation.

use anyhow::Context;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, error};

use crate::{
    config::ApiConfig,
    error::{Error, Result},
};

pub(crate) fn build_client(api: &ApiConfig) -> anyhow::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .user_agent(api.user_agent.as_str())
        .default_headers(headers)
        .connect_timeout(api.connect_timeout())
        .timeout(api.request_timeout())
        .build()
        .context("Failed to build HTTP client")
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    reason: Option<String>,
}

/// Issue exactly one GET and decode the body as `T`.
///
/// Transport faults and non-success statuses become [`Error::Upstream`]; a body that
/// does not decode becomes [`Error::Shape`].
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    service: &'static str,
    url: &str,
    query: &[(&str, String)],
) -> Result<T> {
    debug!(service, url, ?query, "sending request");

    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| transport_error(service, &e))?;

    let status = res.status();
    debug!(service, status = status.as_u16(), "response received");

    let body = res.text().await.map_err(|e| transport_error(service, &e))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.reason)
            .unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), truncate_body(&body)));
        error!(service, status = status.as_u16(), %message, "upstream returned an error status");
        return Err(Error::upstream(service, message));
    }

    serde_json::from_str(&body).map_err(|e| {
        error!(service, error = %e, "failed to decode response body");
        Error::shape(format!("failed to parse {service} response: {e}"))
    })
}

fn transport_error(service: &'static str, e: &reqwest::Error) -> Error {
    let lower = service.to_lowercase();
    let message = if e.is_timeout() {
        format!("request timeout - the {lower} service may be temporarily unavailable: {e}")
    } else if e.is_connect() {
        format!(
            "failed to connect to {lower} service. Please check your internet connection: {e}"
        )
    } else {
        format!("network error: {e}")
    };
    error!(service, error = %e, "request failed");
    Error::upstream(service, message)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
