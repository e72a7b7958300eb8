//! Jira epic mode: find the GitLab merge requests linked from an epic's
//! issues and harvest them under the epic key.
//!
//! Jira is only used for discovery. Once a merge request link is found in an
//! issue comment it goes through the same GitLab pipeline as `--mr-url`.

pub mod epic;
pub mod gateway;
pub mod links;
pub mod locator;

pub use epic::{EpicHarvest, GitLabTokenCheck};
pub use gateway::{EpicGateway, JiraGateway};
pub use links::merge_request_links;
pub use locator::{EpicLocator, IssueKey};

#[cfg(test)]
pub use gateway::MockEpicGateway;

#[cfg(test)]
mod tests;
