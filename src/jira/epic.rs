//! Driver that harvests every merge request linked from a Jira epic.

use std::collections::HashSet;

use crate::progress::{ProgressEvent, ProgressSink};
use crate::review::{
    ChangeSetGateway, HarvestError, HarvestReport, Provider, ReviewHarvest, ReviewKind,
    ReviewReference,
};

use super::gateway::EpicGateway;
use super::links::merge_request_links;
use super::locator::EpicLocator;

/// Whether the GitLab token is checked before the epic is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitLabTokenCheck {
    /// Validate against the configured GitLab host.
    Verify,
    /// No GitLab host was configured; report the skip.
    Skip,
}

/// Walks a Jira epic and feeds each linked merge request into a review
/// harvest namespaced by the epic key.
pub struct EpicHarvest<'run, Jira, Review>
where
    Jira: EpicGateway,
    Review: ChangeSetGateway,
{
    jira: &'run Jira,
    reviews: &'run ReviewHarvest<'run, Review>,
    sink: &'run dyn ProgressSink,
}

impl<'run, Jira, Review> EpicHarvest<'run, Jira, Review>
where
    Jira: EpicGateway,
    Review: ChangeSetGateway,
{
    /// Creates an epic harvest.
    #[must_use]
    pub const fn new(
        jira: &'run Jira,
        reviews: &'run ReviewHarvest<'run, Review>,
        sink: &'run dyn ProgressSink,
    ) -> Self {
        Self {
            jira,
            reviews,
            sink,
        }
    }

    /// Validates the GitLab token (when requested) and then the Jira token.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::InvalidCredential` or `HarvestError::Network`
    /// from whichever check fails first.
    pub async fn validate(&self, gitlab: GitLabTokenCheck) -> Result<(), HarvestError> {
        match gitlab {
            GitLabTokenCheck::Verify => {
                self.reviews.validate(ReviewKind::GitLabMergeRequest).await?;
            }
            GitLabTokenCheck::Skip => {
                tracing::info!("GitLab token check skipped: no GitLab host configured");
                self.sink.record(ProgressEvent::TokenCheckSkipped {
                    provider: Provider::GitLab,
                });
            }
        }

        let identity = self.jira.validate_token().await?;
        tracing::info!(identity = ?identity, "Jira token accepted");
        self.sink.record(ProgressEvent::TokenValidated {
            provider: Provider::Jira,
            identity,
        });
        Ok(())
    }

    /// Validates tokens, lists the epic's issues, and harvests every merge
    /// request linked from their comments.
    ///
    /// A merge request linked from several comments is harvested once.
    ///
    /// # Errors
    ///
    /// Token and issue search failures are fatal. Failures reading one
    /// issue's comments or harvesting one merge request are recorded in the
    /// report and skipped.
    pub async fn harvest(
        &self,
        epic: &EpicLocator,
        gitlab: GitLabTokenCheck,
    ) -> Result<HarvestReport, HarvestError> {
        self.validate(gitlab).await?;

        let epic_key = epic.key().to_string();
        self.sink.record(ProgressEvent::EpicSearchStarted {
            epic: epic_key.clone(),
        });
        let issues = self.jira.epic_issues().await?;
        tracing::info!(epic = %epic_key, count = issues.len(), "epic issues listed");
        self.sink.record(ProgressEvent::EpicIssuesFound {
            epic: epic_key,
            count: issues.len(),
        });

        let mut report = HarvestReport::default();
        let mut seen: HashSet<String> = HashSet::new();
        for issue in &issues {
            let comments = match self.jira.issue_comments(issue).await {
                Ok(comments) => comments,
                Err(error) => {
                    self.record_failure(&mut report, issue.to_string(), error);
                    continue;
                }
            };

            let links = comments.iter().flat_map(|body| merge_request_links(body));
            for link in links {
                if !seen.insert(link.clone()) {
                    continue;
                }
                self.harvest_link(&mut report, link).await;
            }
        }

        self.sink.record(ProgressEvent::BatchFinished {
            succeeded: report.succeeded,
            failed: report.failed.len(),
        });
        Ok(report)
    }

    async fn harvest_link(&self, report: &mut HarvestReport, link: String) {
        self.sink.record(ProgressEvent::ReviewStarted { url: link.clone() });
        let outcome = match ReviewReference::parse(ReviewKind::GitLabMergeRequest, &link) {
            Ok(reference) => self.reviews.harvest(&reference).await,
            Err(error) => Err(error),
        };

        match outcome {
            Ok(mut files) => {
                report.succeeded += 1;
                report.files_written.append(&mut files);
            }
            Err(error) => self.record_failure(report, link, error),
        }
    }

    fn record_failure(&self, report: &mut HarvestReport, item: String, error: HarvestError) {
        tracing::warn!(item = %item, %error, "skipping epic item");
        self.sink.record(ProgressEvent::ReviewFailed {
            url: item.clone(),
            message: error.to_string(),
        });
        report.failed.push((item, error));
    }
}
