use std::time::Duration;

use chowbot_core::errors::{GatewayError, Provider};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::warn;

pub(crate) fn build_client(provider: Provider, timeout_secs: u64) -> Result<Client, GatewayError> {
    Client::builder().timeout(Duration::from_secs(timeout_secs)).build().map_err(|error| {
        GatewayError::configuration(provider, format!("failed to build http client: {error}"))
    })
}

/// GET `url` with `query` and decode the JSON body. Query values may carry API
/// keys, so only the provider and path are logged.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    provider: Provider,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, GatewayError> {
    let response = client.get(url).query(query).send().await.map_err(|error| {
        warn!(
            event_name = "gateway.request_failed",
            provider = provider.as_str(),
            timeout = error.is_timeout(),
            "provider request failed"
        );
        GatewayError::transport(provider, describe_send_error(error))
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!(
            event_name = "gateway.request_rejected",
            provider = provider.as_str(),
            status = %status,
            "provider returned non-success status"
        );
        return Err(GatewayError::transport(provider, format!("HTTP {status}")));
    }

    response.json::<T>().await.map_err(|error| {
        GatewayError::invalid_response(provider, format!("failed to decode response: {error}"))
    })
}

fn describe_send_error(error: reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.without_url().to_string()
    }
}
