//! Tests for operation mode determination and review source selection.

use camino::Utf8Path;
use rstest::rstest;

use crate::HarvestConfig;
use crate::config::{OperationMode, ReviewSource};
use crate::review::{HarvestError, ReviewKind};

const PR_URL: &str = "https://github.com/octo/repo/pull/1";
const MR_URL: &str = "https://gl.example.com/group/project/-/merge_requests/1";
const EPIC_URL: &str = "https://jira.example.com/browse/PAY-1";

#[rstest]
#[case::nothing(HarvestConfig::default(), OperationMode::Unspecified)]
#[case::pr_file(
    HarvestConfig { pr_file: Some("prs.txt".to_owned()), ..Default::default() },
    OperationMode::Review(ReviewKind::GitHubPullRequest)
)]
#[case::commit_url(
    HarvestConfig { commit_url: Some("https://gl.example.com/g/p/-/commit/abcd".to_owned()), ..Default::default() },
    OperationMode::Review(ReviewKind::GitLabCommit)
)]
#[case::epic_beats_everything(
    HarvestConfig {
        epic_url: Some(EPIC_URL.to_owned()),
        pr_url: Some(PR_URL.to_owned()),
        mr_url: Some(MR_URL.to_owned()),
        ..Default::default()
    },
    OperationMode::JiraEpic
)]
#[case::pull_request_beats_merge_request(
    HarvestConfig {
        pr_url: Some(PR_URL.to_owned()),
        mr_file: Some("mrs.txt".to_owned()),
        ..Default::default()
    },
    OperationMode::Review(ReviewKind::GitHubPullRequest)
)]
#[case::merge_request_beats_commit(
    HarvestConfig {
        mr_file: Some("mrs.txt".to_owned()),
        commit_file: Some("commits.txt".to_owned()),
        ..Default::default()
    },
    OperationMode::Review(ReviewKind::GitLabMergeRequest)
)]
fn operation_mode_follows_input_precedence(
    #[case] config: HarvestConfig,
    #[case] expected: OperationMode,
) {
    assert_eq!(config.operation_mode(), expected);
}

#[rstest]
fn operation_mode_ignores_output_settings() {
    let config = HarvestConfig {
        output_dir: "elsewhere".to_owned(),
        full_file: true,
        group_by_review: true,
        ..Default::default()
    };

    assert_eq!(
        config.operation_mode(),
        OperationMode::Unspecified,
        "output settings should not select a mode"
    );
}

#[rstest]
fn review_source_prefers_url_over_file() {
    let config = HarvestConfig {
        mr_url: Some(MR_URL.to_owned()),
        mr_file: Some("mrs.txt".to_owned()),
        ..Default::default()
    };

    assert_eq!(
        config.review_source(ReviewKind::GitLabMergeRequest),
        Ok(ReviewSource::Url(MR_URL))
    );
}

#[rstest]
fn review_source_falls_back_to_file() {
    let config = HarvestConfig {
        commit_file: Some("lists/commits.txt".to_owned()),
        ..Default::default()
    };

    assert_eq!(
        config.review_source(ReviewKind::GitLabCommit),
        Ok(ReviewSource::File(Utf8Path::new("lists/commits.txt")))
    );
}

#[rstest]
fn review_source_without_input_is_missing() {
    let config = HarvestConfig {
        pr_url: Some(PR_URL.to_owned()),
        ..Default::default()
    };

    assert_eq!(
        config.review_source(ReviewKind::GitLabMergeRequest),
        Err(HarvestError::MissingInput)
    );
}

#[rstest]
fn require_epic_url_returns_value_when_present() {
    let config = HarvestConfig {
        epic_url: Some(EPIC_URL.to_owned()),
        ..Default::default()
    };

    assert_eq!(config.require_epic_url(), Ok(EPIC_URL));
    assert_eq!(
        HarvestConfig::default().require_epic_url(),
        Err(HarvestError::MissingInput)
    );
}
