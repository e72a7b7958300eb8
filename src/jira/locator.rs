//! Jira epic URL parsing and issue keys.

use std::fmt;

use url::Url;

use crate::review::HarvestError;

const EXPECTED_EPIC_SHAPE: &str = "Jira epic (/browse/<EPIC-KEY>)";
const SEARCH_MAX_RESULTS: &str = "100";

/// Jira issue key such as `PAY-1234`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueKey(String);

impl IssueKey {
    /// Parses a key made of a project part, a dash, and a number.
    ///
    /// The project part starts with a letter and holds ASCII letters, digits,
    /// or underscores.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let (project, number) = value.rsplit_once('-')?;
        let mut project_chars = project.chars();
        let starts_with_letter = project_chars
            .next()
            .is_some_and(|first| first.is_ascii_alphabetic());
        let project_valid = starts_with_letter
            && project_chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        let number_valid = !number.is_empty() && number.chars().all(|ch| ch.is_ascii_digit());

        (project_valid && number_valid).then(|| Self(value.to_owned()))
    }

    /// Borrow the key.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Parsed Jira epic URL: the Jira base URL and the epic key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpicLocator {
    base: Url,
    key: IssueKey,
}

impl EpicLocator {
    /// Parses an epic URL such as `https://jira.example.com/browse/PAY-42`.
    ///
    /// The key is the last non-empty path segment; the base keeps only the
    /// scheme, host, and port.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::InvalidUrl` when the input is not an absolute
    /// URL with a host and `HarvestError::MalformedReference` when the last
    /// path segment is not an issue key.
    pub fn parse(input: &str) -> Result<Self, HarvestError> {
        let parsed =
            Url::parse(input).map_err(|error| HarvestError::InvalidUrl(error.to_string()))?;
        if parsed.host_str().is_none() {
            return Err(HarvestError::InvalidUrl(format!(
                "{input}: URL must include a host"
            )));
        }

        let key = parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
            .and_then(IssueKey::parse)
            .ok_or_else(|| HarvestError::MalformedReference {
                url: input.to_owned(),
                expected: EXPECTED_EPIC_SHAPE.to_owned(),
            })?;

        let mut base = parsed;
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { base, key })
    }

    /// Jira base URL, e.g. `https://jira.example.com/`.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Epic key.
    #[must_use]
    pub const fn key(&self) -> &IssueKey {
        &self.key
    }

    pub(crate) fn myself_url(&self) -> Result<Url, HarvestError> {
        self.endpoint("rest/api/3/myself")
    }

    /// Issue search for every issue linked to the epic, limited to one page.
    pub(crate) fn epic_search_url(&self) -> Result<Url, HarvestError> {
        let mut url = self.endpoint("rest/api/2/search")?;
        url.query_pairs_mut()
            .append_pair("jql", &format!("\"Epic Link\" = {}", self.key))
            .append_pair("maxResults", SEARCH_MAX_RESULTS)
            .append_pair("fields", "key");
        Ok(url)
    }

    pub(crate) fn issue_url(&self, issue: &IssueKey) -> Result<Url, HarvestError> {
        let mut url = self.endpoint(&format!("rest/api/latest/issue/{issue}"))?;
        url.query_pairs_mut().append_pair("fields", "comment");
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, HarvestError> {
        self.base
            .join(path)
            .map_err(|error| HarvestError::InvalidUrl(error.to_string()))
    }
}
