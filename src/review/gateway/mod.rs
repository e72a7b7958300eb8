//! Gateways for retrieving change sets from GitHub and GitLab.
//!
//! The trait-based design enables mocking in tests while the Octocrab and
//! reqwest implementations handle real HTTP requests.

mod client;
mod error_mapping;
mod github;
mod gitlab;
mod http_utils;

pub use github::OctocrabGateway;
pub use gitlab::GitLabGateway;

pub(crate) use client::build_http_client;
pub(crate) use error_mapping::{map_credential_status, map_transport_error};
pub(crate) use http_utils::{extract_api_message, read_json};

use async_trait::async_trait;

use crate::review::error::HarvestError;
use crate::review::locator::ReviewReference;
use crate::review::models::{ChangeSet, RetrievalMode};

/// Gateway that validates credentials and loads change sets for one provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChangeSetGateway: Send + Sync {
    /// Confirms the provider accepts the configured token.
    ///
    /// Returns the account name when the provider reports one.
    async fn validate_token(&self) -> Result<Option<String>, HarvestError>;

    /// Fetches the changed files of a review unit.
    async fn change_set(
        &self,
        reference: &ReviewReference,
        mode: RetrievalMode,
    ) -> Result<ChangeSet, HarvestError>;
}

#[cfg(test)]
mod tests;
