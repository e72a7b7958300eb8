//! Review URL and URL list harvesting.

use diffharvest::config::ReviewSource;
use diffharvest::output::OutputTree;
use diffharvest::review::{
    GitLabGateway, HarvestError, HarvestOptions, HarvestReport, OctocrabGateway, ReviewBatch,
    ReviewHarvest, ReviewKind, read_url_list,
};
use diffharvest::HarvestConfig;

use super::output::ConsoleProgressSink;

/// Harvests the review units of `kind` named by the configuration.
///
/// # Errors
///
/// Returns [`HarvestError::MissingToken`] or [`HarvestError::MissingInput`]
/// before any request is made, [`HarvestError::InvalidCredential`] when the
/// provider rejects the token, and any per-review error when a single URL
/// was given.
pub async fn run(config: &HarvestConfig, kind: ReviewKind) -> Result<HarvestReport, HarvestError> {
    let token = config.resolve_token(kind.provider())?;
    let batch = match config.review_source(kind)? {
        ReviewSource::Url(url) => ReviewBatch::single(kind, url),
        ReviewSource::File(path) => ReviewBatch::from_urls(kind, read_url_list(path)?)?,
    };
    let api_base = batch.api_base()?.clone();

    let output = OutputTree::open(config.output_dir())?;
    let sink = ConsoleProgressSink::stdout();
    let options = HarvestOptions {
        mode: config.retrieval_mode(),
        removed_lines: config.removed_lines(),
        namespace: config.output_namespace(),
    };

    match kind {
        ReviewKind::GitHubPullRequest => {
            let gateway = OctocrabGateway::for_token(&token, &api_base)?;
            ReviewHarvest::new(&gateway, &output, &sink, options)
                .harvest_batch(&batch)
                .await
        }
        ReviewKind::GitLabMergeRequest | ReviewKind::GitLabCommit => {
            let gateway = GitLabGateway::for_token(&token, Some(&api_base))?;
            ReviewHarvest::new(&gateway, &output, &sink, options)
                .harvest_batch(&batch)
                .await
        }
    }
}
