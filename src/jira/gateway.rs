//! Gateway for the Jira REST endpoints used in epic mode.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::review::gateway::{
    build_http_client, extract_api_message, map_credential_status, map_transport_error, read_json,
};
use crate::review::{HarvestError, PersonalAccessToken, Provider};

use super::locator::{EpicLocator, IssueKey};

const IDENTITY_HEADER: &str = "X-AUSERNAME";
const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Jira operations needed to walk an epic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EpicGateway: Send + Sync {
    /// Confirms Jira recognises the token and returns the account name when
    /// Jira reports one.
    async fn validate_token(&self) -> Result<Option<String>, HarvestError>;

    /// Keys of the issues linked to the epic (first page only).
    async fn epic_issues(&self) -> Result<Vec<IssueKey>, HarvestError>;

    /// Comment bodies of one issue, oldest first.
    async fn issue_comments(&self, issue: &IssueKey) -> Result<Vec<String>, HarvestError>;
}

/// reqwest-backed Jira gateway using bearer authentication.
pub struct JiraGateway {
    client: Client,
    token: PersonalAccessToken,
    epic: EpicLocator,
}

impl JiraGateway {
    /// Creates a gateway for the Jira instance hosting `epic`.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::Configuration` when the HTTP client cannot be
    /// built.
    pub fn for_token(token: &PersonalAccessToken, epic: &EpicLocator) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_http_client()?,
            token: token.clone(),
            epic: epic.clone(),
        })
    }

    async fn get(
        &self,
        operation: &str,
        url: url::Url,
    ) -> Result<reqwest::Response, HarvestError> {
        tracing::debug!(%url, operation, "Jira request");
        self.client
            .get(url)
            .bearer_auth(self.token.value())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| map_transport_error(operation, &error))
    }
}

#[async_trait]
impl EpicGateway for JiraGateway {
    async fn validate_token(&self) -> Result<Option<String>, HarvestError> {
        let response = self
            .get("token validation", self.epic.myself_url()?)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_credential_status(
                Provider::Jira,
                status,
                extract_api_message(&body),
            ));
        }

        let header_identity = response
            .headers()
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let identity = match header_identity {
            Some(identity) => Some(identity),
            None => response
                .json::<ApiMyself>()
                .await
                .ok()
                .and_then(|myself| myself.name.or(myself.display_name)),
        };

        if identity.as_deref() == Some(ANONYMOUS_IDENTITY) {
            return Err(HarvestError::InvalidCredential {
                provider: Provider::Jira,
                message: format!("Jira identified the caller as {ANONYMOUS_IDENTITY}"),
            });
        }
        Ok(identity)
    }

    async fn epic_issues(&self) -> Result<Vec<IssueKey>, HarvestError> {
        let operation = "epic issue search";
        let response = self.get(operation, self.epic.epic_search_url()?).await?;
        let results: ApiSearchResults = read_json(operation, response).await?;

        results
            .issues
            .into_iter()
            .map(|issue| {
                IssueKey::parse(&issue.key).ok_or_else(|| HarvestError::FetchFailed {
                    message: format!("{operation} returned an invalid issue key {}", issue.key),
                })
            })
            .collect()
    }

    async fn issue_comments(&self, issue: &IssueKey) -> Result<Vec<String>, HarvestError> {
        let operation = "issue comments";
        let response = self.get(operation, self.epic.issue_url(issue)?).await?;
        let details: ApiIssue = read_json(operation, response).await?;

        let comments = details
            .fields
            .comment
            .map(|page| page.comments)
            .unwrap_or_default();
        Ok(comments
            .into_iter()
            .filter_map(|comment| match comment.body {
                Some(serde_json::Value::String(body)) => Some(body),
                _ => None,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApiMyself {
    name: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResults {
    #[serde(default)]
    issues: Vec<ApiIssueReference>,
}

#[derive(Debug, Deserialize)]
struct ApiIssueReference {
    key: String,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    fields: ApiIssueFields,
}

#[derive(Debug, Deserialize)]
struct ApiIssueFields {
    comment: Option<ApiCommentPage>,
}

#[derive(Debug, Deserialize)]
struct ApiCommentPage {
    #[serde(default)]
    comments: Vec<ApiComment>,
}

/// Server API v2 bodies are wiki markup strings; document-format objects are
/// skipped.
#[derive(Debug, Deserialize)]
struct ApiComment {
    body: Option<serde_json::Value>,
}
