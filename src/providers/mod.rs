pub mod geodb;
pub mod openweather;
pub mod types;
pub mod unsplash;

use crate::error::UpstreamError;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, UpstreamError> {
    let client = Client::builder()
        .user_agent("CityInfoHub/1.0")
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Sends a prepared request once and decodes the JSON body.
///
/// HTTP 404 becomes [`UpstreamError::NotFound`]; any other non-success status
/// becomes [`UpstreamError::ApiError`] carrying the provider's message.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, UpstreamError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        let json: Value = response.json().await?;
        return Ok(serde_json::from_value(json)?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = provider_message(&body);

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(UpstreamError::NotFound(message));
    }

    Err(UpstreamError::ApiError {
        status: status.as_u16(),
        body: message,
    })
}

/// Pulls `message` out of a JSON error body, falling back to the raw text.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
