//! Jira epic harvesting.

use diffharvest::jira::{EpicHarvest, EpicLocator, GitLabTokenCheck, JiraGateway};
use diffharvest::output::{OutputNamespace, OutputTree};
use diffharvest::review::{
    GitLabGateway, HarvestError, HarvestOptions, HarvestReport, Provider, ReviewHarvest,
};
use diffharvest::HarvestConfig;

use super::output::ConsoleProgressSink;

/// Harvests every merge request linked from the configured epic into
/// `<output_dir>/<EPIC-KEY>/`.
///
/// The GitLab token is verified only when `gitlab_host` is configured.
///
/// # Errors
///
/// Returns [`HarvestError::MissingToken`] when either token is missing,
/// [`HarvestError::InvalidCredential`] when a token is rejected, and the
/// search error when the epic's issues cannot be listed.
pub async fn run(config: &HarvestConfig) -> Result<HarvestReport, HarvestError> {
    let epic = EpicLocator::parse(config.require_epic_url()?)?;
    let gitlab_token = config.resolve_token(Provider::GitLab)?;
    let jira_token = config.resolve_token(Provider::Jira)?;
    let gitlab_api_base = config.gitlab_api_base()?;
    let gitlab_check = if gitlab_api_base.is_some() {
        GitLabTokenCheck::Verify
    } else {
        GitLabTokenCheck::Skip
    };

    let output = OutputTree::open(config.output_dir())?;
    let sink = ConsoleProgressSink::stdout();
    let options = HarvestOptions {
        mode: config.retrieval_mode(),
        removed_lines: config.removed_lines(),
        namespace: OutputNamespace::Epic(epic.key().to_string()),
    };

    let gitlab = GitLabGateway::for_token(&gitlab_token, gitlab_api_base.as_ref())?;
    let jira = JiraGateway::for_token(&jira_token, &epic)?;
    let reviews = ReviewHarvest::new(&gitlab, &output, &sink, options);
    EpicHarvest::new(&jira, &reviews, &sink)
        .harvest(&epic, gitlab_check)
        .await
}
