//! Shared HTTP utilities for the reqwest-backed gateways.

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::review::error::HarvestError;

use super::error_mapping::{map_http_error, map_transport_error};

/// Pulls a human-readable message out of an API error body.
///
/// GitHub and GitLab use `message` (GitLab sometimes `error`), Jira uses
/// `errorMessages`.
pub(crate) fn extract_api_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        let trimmed = body.trim();
        return (!trimmed.is_empty()).then(|| truncate(trimmed, 160));
    };

    if let Some(message) = value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(serde_json::Value::as_str)
    {
        return Some(message.to_owned());
    }

    value
        .get("errorMessages")
        .and_then(serde_json::Value::as_array)
        .and_then(|messages| messages.first())
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}

/// Returns the response unchanged on success, or a `FetchFailed` error that
/// carries the status and any message from the body.
pub(crate) async fn ensure_success(
    operation: &str,
    response: Response,
) -> Result<Response, HarvestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(map_http_error(operation, status, extract_api_message(&body)))
}

/// Decodes a successful JSON response.
pub(crate) async fn read_json<T: DeserializeOwned>(
    operation: &str,
    response: Response,
) -> Result<T, HarvestError> {
    ensure_success(operation, response)
        .await?
        .json::<T>()
        .await
        .map_err(|error| map_transport_error(operation, &error))
}

/// Reads a successful response body as text.
pub(crate) async fn read_text(operation: &str, response: Response) -> Result<String, HarvestError> {
    ensure_success(operation, response)
        .await?
        .text()
        .await
        .map_err(|error| map_transport_error(operation, &error))
}

fn truncate(text: &str, limit: usize) -> String {
    let mut chars = text.chars();
    let mut truncated: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        truncated.push_str("...");
    }
    truncated
}
