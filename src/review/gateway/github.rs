//! Octocrab implementation of the change-set gateway for GitHub.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use octocrab::Octocrab;
use serde::Serialize;
use url::Url;

use crate::review::error::HarvestError;
use crate::review::locator::{PersonalAccessToken, ReviewReference, ReviewUnit};
use crate::review::models::{
    ApiBlob, ApiPullRequestFile, ApiUser, ChangeSet, ChangedFile, RetrievalMode,
};

use super::ChangeSetGateway;
use super::client::build_octocrab_client;
use super::error_mapping::{map_octocrab_credential_error, map_octocrab_error};

const FILES_PER_PAGE: u8 = 100;

#[derive(Serialize)]
struct FilesQuery {
    per_page: u8,
}

/// Octocrab-backed gateway bound to one GitHub API base.
pub struct OctocrabGateway {
    client: Octocrab,
    api_base: Url,
}

impl OctocrabGateway {
    /// Builds an Octocrab client for the given token and API base.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::InvalidUrl` when the base URI cannot be parsed or
    /// `HarvestError::Configuration` when Octocrab fails to construct a client.
    pub fn for_token(token: &PersonalAccessToken, api_base: &Url) -> Result<Self, HarvestError> {
        let client = build_octocrab_client(token, api_base.as_str())?;
        Ok(Self {
            client,
            api_base: api_base.clone(),
        })
    }

    fn ensure_same_host(&self, reference: &ReviewReference) -> Result<(), HarvestError> {
        if reference.api_base() == &self.api_base {
            Ok(())
        } else {
            Err(HarvestError::FetchFailed {
                message: format!(
                    "{} is served by {}, but the token was validated against {}",
                    reference.project(),
                    reference.api_base(),
                    self.api_base
                ),
            })
        }
    }

    async fn combined_diff(&self, reference: &ReviewReference) -> Result<ChangeSet, HarvestError> {
        let ReviewUnit::PullRequest(number) = reference.unit() else {
            return Err(not_a_pull_request(reference));
        };
        let project = reference.project();

        tracing::debug!(%project, number = number.get(), "fetching pull request diff");
        let diff = self
            .client
            .pulls(project.owner().as_str(), project.name().as_str())
            .get_diff(number.get())
            .await
            .map_err(|error| map_octocrab_error("pull request diff", &error))?;

        let file_name = format!(
            "{}-{}-pull-{}.diff",
            project.owner().as_str().replace('/', "-"),
            project.name().as_str(),
            number.get()
        );
        Ok(ChangeSet {
            files: vec![ChangedFile::diff(file_name, diff)],
        })
    }

    async fn full_files(&self, reference: &ReviewReference) -> Result<ChangeSet, HarvestError> {
        tracing::debug!(project = %reference.project(), "listing pull request files");
        let listed = self
            .client
            .get::<Vec<ApiPullRequestFile>, _, _>(
                reference.pull_request_files_path(),
                Some(&FilesQuery {
                    per_page: FILES_PER_PAGE,
                }),
            )
            .await
            .map_err(|error| map_octocrab_error("pull request files", &error))?;

        let mut files = Vec::with_capacity(listed.len());
        for entry in listed {
            if entry.is_removed() {
                tracing::debug!(path = %entry.filename, "skipping removed file");
                continue;
            }
            let Some(sha) = entry.sha else {
                return Err(HarvestError::FetchFailed {
                    message: format!("pull request file {} has no blob sha", entry.filename),
                });
            };

            match self.blob_text(reference, &sha).await? {
                Some(content) => files.push(ChangedFile {
                    blob_sha: Some(sha),
                    ..ChangedFile::full(entry.filename, content)
                }),
                None => {
                    tracing::warn!(path = %entry.filename, %sha, "skipping non UTF-8 blob");
                }
            }
        }

        Ok(ChangeSet { files })
    }

    /// Fetches and decodes a blob; `None` when it is not UTF-8 text.
    async fn blob_text(
        &self,
        reference: &ReviewReference,
        sha: &str,
    ) -> Result<Option<String>, HarvestError> {
        let blob = self
            .client
            .get::<ApiBlob, _, _>(reference.blob_path(sha), None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("blob", &error))?;

        let bytes = decode_blob(&blob)?;
        Ok(String::from_utf8(bytes).ok())
    }
}

#[async_trait]
impl ChangeSetGateway for OctocrabGateway {
    async fn validate_token(&self) -> Result<Option<String>, HarvestError> {
        tracing::debug!(api_base = %self.api_base, "validating GitHub token");
        self.client
            .get::<ApiUser, _, _>("/user", None::<&()>)
            .await
            .map(|user| user.login)
            .map_err(|error| map_octocrab_credential_error(&error))
    }

    async fn change_set(
        &self,
        reference: &ReviewReference,
        mode: RetrievalMode,
    ) -> Result<ChangeSet, HarvestError> {
        self.ensure_same_host(reference)?;
        if !matches!(reference.unit(), ReviewUnit::PullRequest(_)) {
            return Err(not_a_pull_request(reference));
        }

        match mode {
            RetrievalMode::Diff => self.combined_diff(reference).await,
            RetrievalMode::FullFile => self.full_files(reference).await,
        }
    }
}

fn not_a_pull_request(reference: &ReviewReference) -> HarvestError {
    HarvestError::FetchFailed {
        message: format!(
            "{} {} is not a GitHub pull request",
            reference.project(),
            reference.unit()
        ),
    }
}

fn decode_blob(blob: &ApiBlob) -> Result<Vec<u8>, HarvestError> {
    match blob.encoding.as_deref() {
        Some("base64") | None => {
            let compact: String = blob.content.split_whitespace().collect();
            STANDARD
                .decode(compact)
                .map_err(|error| HarvestError::FetchFailed {
                    message: format!("blob content is not valid base64: {error}"),
                })
        }
        Some("utf-8") => Ok(blob.content.clone().into_bytes()),
        Some(other) => Err(HarvestError::FetchFailed {
            message: format!("unsupported blob encoding {other}"),
        }),
    }
}
