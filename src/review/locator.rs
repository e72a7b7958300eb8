//! URL parsing and identity wrappers for review units.
//!
//! Web URLs for GitHub pull requests, GitLab merge requests, and GitLab
//! commits are parsed into a [`ReviewReference`] that knows its API base and
//! how to build the REST endpoints for its provider.

use std::fmt;

use camino::Utf8PathBuf;
use url::Url;

use super::error::HarvestError;

const GITHUB_API_PATH: &str = "api/v3";
const GITLAB_API_PATH: &str = "api/v4";

/// Remote service a credential or review unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// GitHub or GitHub Enterprise.
    GitHub,
    /// GitLab (self-hosted or gitlab.com).
    GitLab,
    /// Jira (server or data center).
    Jira,
}

impl Provider {
    /// CLI flag that supplies this provider's token.
    #[must_use]
    pub const fn token_flag(self) -> &'static str {
        match self {
            Self::GitHub => "github-token",
            Self::GitLab => "gitlab-token",
            Self::Jira => "jira-token",
        }
    }

    /// Environment variable consulted when no token was configured.
    #[must_use]
    pub const fn token_env(self) -> &'static str {
        match self {
            Self::GitHub => "GITHUB_API_TOKEN",
            Self::GitLab => "GITLAB_API_TOKEN",
            Self::Jira => "JIRA_API_TOKEN",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GitHub => "GitHub",
            Self::GitLab => "GitLab",
            Self::Jira => "Jira",
        };
        formatter.write_str(name)
    }
}

/// Repository owner or GitLab namespace (which may contain nested groups).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    fn new(value: &str) -> Option<Self> {
        if value.is_empty() || value.split('/').any(str::is_empty) {
            return None;
        }
        Some(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository or project name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    fn new(value: &str) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        Some(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Owner and name of the repository hosting a review unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPath {
    owner: RepositoryOwner,
    name: RepositoryName,
}

impl ProjectPath {
    /// Repository owner or namespace.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn name(&self) -> &RepositoryName {
        &self.name
    }

    /// Path-encoded project identifier accepted by the GitLab API, e.g.
    /// `group%2Fproject`.
    #[must_use]
    pub fn encoded(&self) -> String {
        format!(
            "{}%2F{}",
            self.owner.as_str().replace('/', "%2F"),
            self.name.as_str()
        )
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.owner.as_str(), self.name.as_str())
    }
}

/// Pull request number or merge request IID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewNumber(u64);

impl ReviewNumber {
    fn parse(value: &str) -> Option<Self> {
        value.parse::<u64>().ok().filter(|number| *number > 0).map(Self)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Hexadecimal commit hash, full or abbreviated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSha(String);

impl CommitSha {
    fn parse(value: &str) -> Option<Self> {
        let plausible_length = (4..=64).contains(&value.len());
        if plausible_length && value.chars().all(|ch| ch.is_ascii_hexdigit()) {
            Some(Self(value.to_owned()))
        } else {
            None
        }
    }

    /// Borrow the hash.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::MissingToken` when the supplied string is blank.
    pub fn new(provider: Provider, token: impl AsRef<str>) -> Result<Self, HarvestError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(HarvestError::MissingToken { provider });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("PersonalAccessToken(<redacted>)")
    }
}

/// The kind of review unit a URL is expected to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewKind {
    /// `/<owner>/<repo>/pull/<number>` on GitHub.
    GitHubPullRequest,
    /// `/<namespace>/<project>/-/merge_requests/<iid>` on GitLab.
    GitLabMergeRequest,
    /// `/<namespace>/<project>/-/commit/<sha>` on GitLab.
    GitLabCommit,
}

impl ReviewKind {
    /// Provider serving this kind of review unit.
    #[must_use]
    pub const fn provider(self) -> Provider {
        match self {
            Self::GitHubPullRequest => Provider::GitHub,
            Self::GitLabMergeRequest | Self::GitLabCommit => Provider::GitLab,
        }
    }

    const fn expected_shape(self) -> &'static str {
        match self {
            Self::GitHubPullRequest => "GitHub pull request (/<owner>/<repo>/pull/<number>)",
            Self::GitLabMergeRequest => {
                "GitLab merge request (/<namespace>/<project>/-/merge_requests/<iid>)"
            }
            Self::GitLabCommit => "GitLab commit (/<namespace>/<project>/-/commit/<sha>)",
        }
    }

    const fn gitlab_marker(self) -> &'static str {
        match self {
            Self::GitLabCommit => "commit",
            Self::GitHubPullRequest | Self::GitLabMergeRequest => "merge_requests",
        }
    }
}

/// Identifier of the review unit within its project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewUnit {
    /// GitHub pull request.
    PullRequest(ReviewNumber),
    /// GitLab merge request.
    MergeRequest(ReviewNumber),
    /// GitLab commit.
    Commit(CommitSha),
}

impl fmt::Display for ReviewUnit {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PullRequest(number) | Self::MergeRequest(number) => {
                write!(formatter, "{}", number.get())
            }
            Self::Commit(sha) => formatter.write_str(sha.as_str()),
        }
    }
}

/// Derives the API base URL from a host string.
fn derive_api_base_from_host(
    provider: Provider,
    scheme: &str,
    host: &str,
    port: Option<u16>,
) -> Result<Url, HarvestError> {
    if provider == Provider::GitHub && host.eq_ignore_ascii_case("github.com") {
        return Url::parse("https://api.github.com")
            .map_err(|error| HarvestError::InvalidUrl(error.to_string()));
    }

    let authority = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_owned()
    };
    let mut api_url = Url::parse(&format!("{scheme}://{authority}"))
        .map_err(|error| HarvestError::InvalidUrl(error.to_string()))?;

    api_url
        .set_port(port)
        .map_err(|()| HarvestError::InvalidUrl("invalid port".to_owned()))?;
    if provider == Provider::GitLab {
        api_url.set_path(GITLAB_API_PATH);
    } else {
        api_url.set_path(GITHUB_API_PATH);
    }
    Ok(api_url)
}

/// Derives the API base URL from a parsed URL.
fn derive_api_base(provider: Provider, parsed: &Url) -> Result<Url, HarvestError> {
    let host = parsed
        .host_str()
        .ok_or_else(|| HarvestError::InvalidUrl("URL must include a host".to_owned()))?;

    derive_api_base_from_host(provider, parsed.scheme(), host, parsed.port())
}

/// Parsed review unit URL and derived API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReference {
    api_base: Url,
    project: ProjectPath,
    unit: ReviewUnit,
}

impl ReviewReference {
    /// Parses a review unit URL of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::InvalidUrl` when the input is not a URL and
    /// `HarvestError::MalformedReference` when its path does not match the
    /// shape expected for `kind`.
    pub fn parse(kind: ReviewKind, input: &str) -> Result<Self, HarvestError> {
        let parsed =
            Url::parse(input).map_err(|error| HarvestError::InvalidUrl(error.to_string()))?;
        let malformed = || HarvestError::MalformedReference {
            url: input.to_owned(),
            expected: kind.expected_shape().to_owned(),
        };

        let segments: Vec<&str> = parsed.path_segments().ok_or_else(malformed)?.collect();
        let (project, unit) = match kind {
            ReviewKind::GitHubPullRequest => parse_github_segments(&segments),
            ReviewKind::GitLabMergeRequest | ReviewKind::GitLabCommit => {
                parse_gitlab_segments(kind, &segments)
            }
        }
        .ok_or_else(malformed)?;

        let api_base = derive_api_base(kind.provider(), &parsed)?;

        Ok(Self {
            api_base,
            project,
            unit,
        })
    }

    /// API base URL derived from the review host.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository hosting the review unit.
    #[must_use]
    pub const fn project(&self) -> &ProjectPath {
        &self.project
    }

    /// Pull request, merge request, or commit identifier.
    #[must_use]
    pub const fn unit(&self) -> &ReviewUnit {
        &self.unit
    }

    /// Kind of review unit this reference points at.
    #[must_use]
    pub const fn kind(&self) -> ReviewKind {
        match self.unit {
            ReviewUnit::PullRequest(_) => ReviewKind::GitHubPullRequest,
            ReviewUnit::MergeRequest(_) => ReviewKind::GitLabMergeRequest,
            ReviewUnit::Commit(_) => ReviewKind::GitLabCommit,
        }
    }

    /// Provider serving the review unit.
    #[must_use]
    pub const fn provider(&self) -> Provider {
        self.kind().provider()
    }

    /// Directory used when output is grouped per review unit:
    /// `<owner>/<name>/<unit>`.
    #[must_use]
    pub fn review_directory(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.project.owner.as_str())
            .join(self.project.name.as_str())
            .join(self.unit.to_string())
    }

    pub(crate) fn pull_request_path(&self) -> String {
        format!(
            "/repos/{}/{}/pulls/{}",
            self.project.owner.as_str(),
            self.project.name.as_str(),
            self.unit
        )
    }

    pub(crate) fn pull_request_files_path(&self) -> String {
        format!("{}/files", self.pull_request_path())
    }

    pub(crate) fn blob_path(&self, sha: &str) -> String {
        format!(
            "/repos/{}/{}/git/blobs/{sha}",
            self.project.owner.as_str(),
            self.project.name.as_str()
        )
    }

    fn gitlab_project_url(&self, suffix: &str) -> Result<Url, HarvestError> {
        let raw = format!(
            "{}/projects/{}/{suffix}",
            self.api_base.as_str().trim_end_matches('/'),
            self.project.encoded()
        );
        Url::parse(&raw).map_err(|error| HarvestError::InvalidUrl(error.to_string()))
    }

    pub(crate) fn merge_request_changes_url(&self) -> Result<Url, HarvestError> {
        self.gitlab_project_url(&format!("merge_requests/{}/changes", self.unit))
    }

    pub(crate) fn commit_diff_url(&self) -> Result<Url, HarvestError> {
        self.gitlab_project_url(&format!("repository/commits/{}/diff", self.unit))
    }

    /// `.../repository/files/<path>/raw?ref=<git_ref>` with the file path
    /// encoded as a single segment.
    pub(crate) fn raw_file_url(&self, file_path: &str, git_ref: &str) -> Result<Url, HarvestError> {
        let mut url = self.gitlab_project_url("repository/files")?;
        url.path_segments_mut()
            .map_err(|()| HarvestError::InvalidUrl(format!("cannot extend {}", self.api_base)))?
            .push(file_path)
            .push("raw");
        url.query_pairs_mut().append_pair("ref", git_ref);
        Ok(url)
    }
}

fn parse_github_segments(segments: &[&str]) -> Option<(ProjectPath, ReviewUnit)> {
    let mut iter = segments.iter().copied();
    let owner = RepositoryOwner::new(iter.next()?)?;
    let name = RepositoryName::new(iter.next()?)?;
    if iter.next()? != "pull" {
        return None;
    }
    let number = ReviewNumber::parse(iter.next()?)?;

    Some((ProjectPath { owner, name }, ReviewUnit::PullRequest(number)))
}

fn parse_gitlab_segments(kind: ReviewKind, segments: &[&str]) -> Option<(ProjectPath, ReviewUnit)> {
    let separator = segments.iter().position(|segment| *segment == "-")?;
    let (project_segments, rest) = segments.split_at_checked(separator)?;
    let (name_segment, namespace_segments) = project_segments.split_last()?;
    if namespace_segments.is_empty() {
        return None;
    }

    let owner = RepositoryOwner::new(&namespace_segments.join("/"))?;
    let name = RepositoryName::new(name_segment)?;

    let mut iter = rest.iter().copied().skip(1);
    if iter.next()? != kind.gitlab_marker() {
        return None;
    }
    let identifier = iter.next()?;
    let unit = match kind {
        ReviewKind::GitLabCommit => ReviewUnit::Commit(CommitSha::parse(identifier)?),
        ReviewKind::GitLabMergeRequest | ReviewKind::GitHubPullRequest => {
            ReviewUnit::MergeRequest(ReviewNumber::parse(identifier)?)
        }
    };

    Some((ProjectPath { owner, name }, unit))
}
