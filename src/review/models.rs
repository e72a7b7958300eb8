//! Data models for change sets retrieved from GitHub and GitLab.
//!
//! Types prefixed with `Api` are internal deserialisation targets that convert
//! into the public domain types.

use serde::Deserialize;

use crate::beautify::{RemovedLines, beautify};

/// What to download for each changed file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Unified diff text, beautified before it is written.
    #[default]
    Diff,
    /// Complete file content at the review's head revision, written verbatim.
    FullFile,
}

/// Downloaded content for one changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Unified diff text.
    Diff(String),
    /// Full file content.
    Full(String),
}

/// One file touched by a review unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Forward-slash separated path relative to the repository root.
    pub path: String,
    /// Diff or full content depending on the retrieval mode.
    pub content: FileContent,
    /// Blob sha when the provider reports one.
    pub blob_sha: Option<String>,
}

impl ChangedFile {
    /// Creates a changed file carrying diff text.
    #[must_use]
    pub fn diff(path: impl Into<String>, diff: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: FileContent::Diff(diff.into()),
            blob_sha: None,
        }
    }

    /// Creates a changed file carrying full content.
    #[must_use]
    pub fn full(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: FileContent::Full(content.into()),
            blob_sha: None,
        }
    }

    /// Text written to disk: beautified diff, or full content unchanged.
    #[must_use]
    pub fn rendered(&self, removed_lines: RemovedLines) -> String {
        match &self.content {
            FileContent::Diff(diff) => beautify(diff, removed_lines),
            FileContent::Full(content) => content.clone(),
        }
    }
}

/// All changed files of one pull request, merge request, or commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Files in the order the provider listed them.
    pub files: Vec<ChangedFile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiUser {
    pub(crate) login: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPullRequestFile {
    pub(crate) filename: String,
    pub(crate) sha: Option<String>,
    pub(crate) status: Option<String>,
}

impl ApiPullRequestFile {
    pub(crate) fn is_removed(&self) -> bool {
        self.status.as_deref() == Some("removed")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiBlob {
    pub(crate) content: String,
    pub(crate) encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiGitLabDiff {
    pub(crate) new_path: String,
    pub(crate) diff: String,
    #[serde(default)]
    pub(crate) deleted_file: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMergeRequestChanges {
    pub(crate) sha: Option<String>,
    pub(crate) changes: Vec<ApiGitLabDiff>,
}
