//! reqwest implementation of the change-set gateway for GitLab.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::review::error::HarvestError;
use crate::review::locator::{PersonalAccessToken, Provider, ReviewReference, ReviewUnit};
use crate::review::models::{
    ApiGitLabDiff, ApiMergeRequestChanges, ChangeSet, ChangedFile, RetrievalMode,
};

use super::ChangeSetGateway;
use super::client::build_http_client;
use super::error_mapping::{map_credential_status, map_transport_error};
use super::http_utils::{extract_api_message, read_json, read_text};

const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// GitLab gateway authenticating with a `PRIVATE-TOKEN` header.
///
/// Change sets are fetched from the host named in each reference; the
/// validation API base is only used for token validation.
pub struct GitLabGateway {
    client: Client,
    token: PersonalAccessToken,
    validation_base: Option<Url>,
}

impl GitLabGateway {
    /// Creates a gateway validating tokens against `validation_base`
    /// (e.g. `https://gitlab.example.com/api/v4`).
    ///
    /// Without a validation base, [`ChangeSetGateway::validate_token`] fails
    /// with `HarvestError::Configuration`.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::Configuration` when the HTTP client cannot be
    /// built.
    pub fn for_token(
        token: &PersonalAccessToken,
        validation_base: Option<&Url>,
    ) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_http_client()?,
            token: token.clone(),
            validation_base: validation_base.cloned(),
        })
    }

    /// Derives the `/api/v4` base from a bare GitLab host URL such as
    /// `https://gitlab.example.com`.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::InvalidUrl` when `host` is not an absolute URL.
    pub fn api_base_for_host(host: &str) -> Result<Url, HarvestError> {
        let parsed = Url::parse(host.trim_end_matches('/'))
            .map_err(|error| HarvestError::InvalidUrl(format!("{host}: {error}")))?;
        if parsed.host_str().is_none() {
            return Err(HarvestError::InvalidUrl(format!("{host}: URL must include a host")));
        }
        let mut api_base = parsed;
        api_base.set_path("api/v4");
        api_base.set_query(None);
        Ok(api_base)
    }

    async fn get(&self, operation: &str, url: Url) -> Result<reqwest::Response, HarvestError> {
        tracing::debug!(%url, operation, "GitLab request");
        self.client
            .get(url)
            .header(PRIVATE_TOKEN_HEADER, self.token.value())
            .send()
            .await
            .map_err(|error| map_transport_error(operation, &error))
    }

    async fn merge_request_changes(
        &self,
        reference: &ReviewReference,
        mode: RetrievalMode,
    ) -> Result<ChangeSet, HarvestError> {
        let operation = "merge request changes";
        let response = self
            .get(operation, reference.merge_request_changes_url()?)
            .await?;
        let changes: ApiMergeRequestChanges = read_json(operation, response).await?;

        match mode {
            RetrievalMode::Diff => Ok(diff_change_set(changes.changes)),
            RetrievalMode::FullFile => {
                let head = changes.sha.ok_or_else(|| HarvestError::FetchFailed {
                    message: format!(
                        "merge request {} {} did not report a head sha",
                        reference.project(),
                        reference.unit()
                    ),
                })?;
                self.full_change_set(reference, changes.changes, &head).await
            }
        }
    }

    async fn commit_diff(
        &self,
        reference: &ReviewReference,
        mode: RetrievalMode,
    ) -> Result<ChangeSet, HarvestError> {
        let ReviewUnit::Commit(sha) = reference.unit() else {
            return Err(unsupported_unit(reference));
        };
        let operation = "commit diff";
        let response = self.get(operation, reference.commit_diff_url()?).await?;
        let diffs: Vec<ApiGitLabDiff> = read_json(operation, response).await?;

        match mode {
            RetrievalMode::Diff => Ok(diff_change_set(diffs)),
            RetrievalMode::FullFile => self.full_change_set(reference, diffs, sha.as_str()).await,
        }
    }

    async fn full_change_set(
        &self,
        reference: &ReviewReference,
        diffs: Vec<ApiGitLabDiff>,
        git_ref: &str,
    ) -> Result<ChangeSet, HarvestError> {
        let mut files = Vec::with_capacity(diffs.len());
        for diff in diffs {
            if diff.deleted_file {
                tracing::debug!(path = %diff.new_path, "skipping deleted file");
                continue;
            }
            let url = reference.raw_file_url(&diff.new_path, git_ref)?;
            let response = self.get("raw file", url).await?;
            let content = read_text("raw file", response).await?;
            files.push(ChangedFile::full(diff.new_path, content));
        }
        Ok(ChangeSet { files })
    }
}

#[async_trait]
impl ChangeSetGateway for GitLabGateway {
    async fn validate_token(&self) -> Result<Option<String>, HarvestError> {
        let api_base = self
            .validation_base
            .as_ref()
            .ok_or_else(|| HarvestError::Configuration {
                message: "a GitLab host is required to validate the GitLab token".to_owned(),
            })?;
        let url = format!(
            "{}/personal_access_tokens/self",
            api_base.as_str().trim_end_matches('/')
        );
        let url = Url::parse(&url).map_err(|error| HarvestError::InvalidUrl(error.to_string()))?;
        let response = self.get("token validation", url).await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(map_credential_status(
                Provider::GitLab,
                status,
                extract_api_message(&body),
            ));
        }

        let identity = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|token| token.get("name").and_then(|name| name.as_str().map(ToOwned::to_owned)));
        Ok(identity)
    }

    async fn change_set(
        &self,
        reference: &ReviewReference,
        mode: RetrievalMode,
    ) -> Result<ChangeSet, HarvestError> {
        match reference.unit() {
            ReviewUnit::MergeRequest(_) => self.merge_request_changes(reference, mode).await,
            ReviewUnit::Commit(_) => self.commit_diff(reference, mode).await,
            ReviewUnit::PullRequest(_) => Err(unsupported_unit(reference)),
        }
    }
}

fn diff_change_set(diffs: Vec<ApiGitLabDiff>) -> ChangeSet {
    ChangeSet {
        files: diffs
            .into_iter()
            .map(|entry| ChangedFile::diff(entry.new_path, entry.diff))
            .collect(),
    }
}

fn unsupported_unit(reference: &ReviewReference) -> HarvestError {
    HarvestError::FetchFailed {
        message: format!(
            "{} {} is not a GitLab merge request or commit",
            reference.project(),
            reference.unit()
        ),
    }
}
