//! Application configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.diffharvest.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `DIFFHARVEST_*`, e.g.
//!    `DIFFHARVEST_OUTPUT_DIR`
//! 4. **Command-line arguments** – e.g. `--mr-url`/`-m`
//!
//! Tokens additionally fall back to `GITHUB_API_TOKEN`, `GITLAB_API_TOKEN`,
//! and `JIRA_API_TOKEN` when no layer supplies them.
//!
//! # Configuration File
//!
//! ```toml
//! gitlab_host = "https://gitlab.example.com"
//! output_dir = "reviews"
//! keep_removed_lines = true
//! group_by_review = true
//! ```

use std::env;

use camino::Utf8Path;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::beautify::RemovedLines;
use crate::output::{DEFAULT_OUTPUT_DIR, OutputNamespace};
use crate::review::{
    GitLabGateway, HarvestError, PersonalAccessToken, Provider, RetrievalMode, ReviewKind,
};

/// Operation mode determined by which input was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Harvest the merge requests linked from a Jira epic.
    JiraEpic,
    /// Harvest review units of one kind from a URL or a URL list file.
    Review(ReviewKind),
    /// No input was supplied.
    Unspecified,
}

/// Where the review URLs of a run come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSource<'config> {
    /// One URL; failures are fatal.
    Url(&'config str),
    /// A file of newline-separated URLs; failures are skipped.
    File(&'config Utf8Path),
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// Boolean switches (`full_file`, `keep_removed_lines`, `group_by_review`)
/// are read from the CLI and configuration files only, because `ortho_config`
/// does not load boolean values from the environment.
///
/// # Example
///
/// ```no_run
/// use diffharvest::HarvestConfig;
/// use diffharvest::review::Provider;
/// use ortho_config::OrthoConfig;
///
/// let config = HarvestConfig::load().expect("failed to load configuration");
/// let token = config.resolve_token(Provider::GitLab).expect("token required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "DIFFHARVEST",
    discovery(
        dotfile_name = ".diffharvest.toml",
        config_file_name = "diffharvest.toml",
        app_name = "diffharvest"
    )
)]
pub struct HarvestConfig {
    /// GitHub pull request URL.
    #[ortho_config(cli_short = 'p')]
    pub pr_url: Option<String>,

    /// File of GitHub pull request URLs, one per line.
    #[ortho_config(cli_short = 'P')]
    pub pr_file: Option<String>,

    /// GitLab merge request URL.
    #[ortho_config(cli_short = 'm')]
    pub mr_url: Option<String>,

    /// File of GitLab merge request URLs, one per line.
    #[ortho_config(cli_short = 'M')]
    pub mr_file: Option<String>,

    /// GitLab commit URL.
    #[ortho_config(cli_short = 'c')]
    pub commit_url: Option<String>,

    /// File of GitLab commit URLs, one per line.
    #[ortho_config(cli_short = 'C')]
    pub commit_file: Option<String>,

    /// Jira epic URL whose issues link GitLab merge requests.
    #[ortho_config(cli_short = 'e')]
    pub epic_url: Option<String>,

    /// GitHub personal access token (falls back to `GITHUB_API_TOKEN`).
    #[ortho_config(cli_short = 'g')]
    pub github_token: Option<String>,

    /// GitLab personal access token (falls back to `GITLAB_API_TOKEN`).
    #[ortho_config(cli_short = 't')]
    pub gitlab_token: Option<String>,

    /// Jira personal access token (falls back to `JIRA_API_TOKEN`).
    #[ortho_config(cli_short = 'j')]
    pub jira_token: Option<String>,

    /// GitLab host the token is verified against in Jira epic mode, e.g.
    /// `https://gitlab.example.com`. Verification is skipped when unset.
    #[ortho_config(cli_short = 'l')]
    pub gitlab_host: Option<String>,

    /// Directory harvested files are written below.
    ///
    /// Defaults to `results`.
    #[ortho_config(cli_short = 'o')]
    pub output_dir: String,

    /// Fetch complete file content instead of diffs.
    #[ortho_config(cli_short = 'f')]
    pub full_file: bool,

    /// Keep removed lines (with the `-` marker stripped) when beautifying.
    #[ortho_config(cli_short = 'k')]
    pub keep_removed_lines: bool,

    /// Write each review unit below `<owner>/<name>/<unit>`.
    #[ortho_config(cli_short = 'G')]
    pub group_by_review: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            pr_url: None,
            pr_file: None,
            mr_url: None,
            mr_file: None,
            commit_url: None,
            commit_file: None,
            epic_url: None,
            github_token: None,
            gitlab_token: None,
            jira_token: None,
            gitlab_host: None,
            output_dir: DEFAULT_OUTPUT_DIR.to_owned(),
            full_file: false,
            keep_removed_lines: false,
            group_by_review: false,
        }
    }
}

impl HarvestConfig {
    /// Determines the operation mode from the supplied inputs.
    ///
    /// Precedence is epic, pull request, merge request, then commit; within a
    /// kind the single URL and the list file select the same mode.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        if self.epic_url.is_some() {
            OperationMode::JiraEpic
        } else if self.pr_url.is_some() || self.pr_file.is_some() {
            OperationMode::Review(ReviewKind::GitHubPullRequest)
        } else if self.mr_url.is_some() || self.mr_file.is_some() {
            OperationMode::Review(ReviewKind::GitLabMergeRequest)
        } else if self.commit_url.is_some() || self.commit_file.is_some() {
            OperationMode::Review(ReviewKind::GitLabCommit)
        } else {
            OperationMode::Unspecified
        }
    }

    /// Returns the URL or list file for `kind`, preferring the URL.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::MissingInput`] when neither is configured.
    pub fn review_source(&self, kind: ReviewKind) -> Result<ReviewSource<'_>, HarvestError> {
        let (url, file) = match kind {
            ReviewKind::GitHubPullRequest => (&self.pr_url, &self.pr_file),
            ReviewKind::GitLabMergeRequest => (&self.mr_url, &self.mr_file),
            ReviewKind::GitLabCommit => (&self.commit_url, &self.commit_file),
        };

        match (url.as_deref(), file.as_deref()) {
            (Some(url), _) => Ok(ReviewSource::Url(url)),
            (None, Some(file)) => Ok(ReviewSource::File(Utf8Path::new(file))),
            (None, None) => Err(HarvestError::MissingInput),
        }
    }

    /// Returns the Jira epic URL or an error if missing.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::MissingInput`] when no epic URL is configured.
    pub fn require_epic_url(&self) -> Result<&str, HarvestError> {
        self.epic_url.as_deref().ok_or(HarvestError::MissingInput)
    }

    /// Resolves the token for `provider` from configuration, falling back to
    /// the provider's `*_API_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::MissingToken`] when no source provides a
    /// non-blank value.
    pub fn resolve_token(&self, provider: Provider) -> Result<PersonalAccessToken, HarvestError> {
        let configured = match provider {
            Provider::GitHub => &self.github_token,
            Provider::GitLab => &self.gitlab_token,
            Provider::Jira => &self.jira_token,
        };

        let value = configured
            .clone()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| env::var(provider.token_env()).ok())
            .ok_or(HarvestError::MissingToken { provider })?;
        PersonalAccessToken::new(provider, value)
    }

    /// GitLab API base derived from `gitlab_host`, when configured.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidUrl`] when the host is not a URL.
    pub fn gitlab_api_base(&self) -> Result<Option<Url>, HarvestError> {
        self.gitlab_host
            .as_deref()
            .map(GitLabGateway::api_base_for_host)
            .transpose()
    }

    /// Output root directory.
    #[must_use]
    pub fn output_dir(&self) -> &Utf8Path {
        Utf8Path::new(&self.output_dir)
    }

    /// Diff or full-file retrieval.
    #[must_use]
    pub const fn retrieval_mode(&self) -> RetrievalMode {
        if self.full_file {
            RetrievalMode::FullFile
        } else {
            RetrievalMode::Diff
        }
    }

    /// Removed-line policy for beautification.
    #[must_use]
    pub const fn removed_lines(&self) -> RemovedLines {
        if self.keep_removed_lines {
            RemovedLines::Keep
        } else {
            RemovedLines::Drop
        }
    }

    /// Namespace for review modes: per review when grouping, flat otherwise.
    #[must_use]
    pub const fn output_namespace(&self) -> OutputNamespace {
        if self.group_by_review {
            OutputNamespace::PerReview
        } else {
            OutputNamespace::Flat
        }
    }
}

#[cfg(test)]
mod tests;
