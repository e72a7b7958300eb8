//! diffharvest library crate for downloading and beautifying code review
//! artefacts.
//!
//! The library parses GitHub pull request, GitLab merge request, GitLab
//! commit, and Jira epic URLs, validates personal access tokens, retrieves
//! change sets through provider gateways, strips diff noise, and writes the
//! result below a capability-scoped output directory.

pub mod beautify;
pub mod config;
pub mod jira;
pub mod output;
pub mod progress;
pub mod review;

pub use beautify::{RemovedLines, beautify};
pub use config::HarvestConfig;
pub use jira::{EpicHarvest, EpicLocator, JiraGateway};
pub use output::{OutputNamespace, OutputTree};
pub use progress::{ProgressEvent, ProgressSink};
pub use review::{
    GitLabGateway, HarvestError, HarvestOptions, HarvestReport, OctocrabGateway, ReviewBatch,
    ReviewHarvest, ReviewKind, ReviewReference,
};
