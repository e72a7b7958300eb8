//! HTTP client construction helpers for gateway implementations.

use http::Uri;
use octocrab::Octocrab;

use crate::review::error::HarvestError;
use crate::review::locator::PersonalAccessToken;

use super::error_mapping::map_octocrab_error;

const USER_AGENT: &str = concat!("diffharvest/", env!("CARGO_PKG_VERSION"));

/// Builds an Octocrab client for the given token and API base URL.
///
/// # Errors
///
/// Returns `HarvestError::InvalidUrl` when the base URI cannot be parsed or
/// `HarvestError::Configuration` when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &str,
) -> Result<Octocrab, HarvestError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| HarvestError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| HarvestError::Configuration {
            message: format!("build GitHub client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build GitHub client", &error))
}

/// Builds the reqwest client shared by the GitLab and Jira gateways.
///
/// # Errors
///
/// Returns `HarvestError::Configuration` when the TLS backend cannot be
/// initialised.
pub(crate) fn build_http_client() -> Result<reqwest::Client, HarvestError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|error| HarvestError::Configuration {
            message: format!("failed to configure HTTP client: {error}"),
        })
}
