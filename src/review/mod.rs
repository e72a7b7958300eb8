//! Review unit harvesting for GitHub pull requests and GitLab merge requests
//! and commits.
//!
//! This module parses review URLs into provider API endpoints, validates
//! personal access tokens, downloads change sets through a provider gateway,
//! and writes each changed file below the output root. Provider failures are
//! mapped into [`HarvestError`] variants so the CLI can tell fatal errors from
//! per-item ones.

pub mod error;
pub mod gateway;
pub mod harvest;
pub mod locator;
pub mod models;

pub use error::HarvestError;
pub use gateway::{ChangeSetGateway, GitLabGateway, OctocrabGateway};
pub use harvest::{
    BatchEntry, BatchKind, HarvestOptions, HarvestReport, ReviewBatch, ReviewHarvest,
    read_url_list,
};
pub use locator::{
    CommitSha, PersonalAccessToken, ProjectPath, Provider, RepositoryName, RepositoryOwner,
    ReviewKind, ReviewNumber, ReviewReference, ReviewUnit,
};
pub use models::{ChangeSet, ChangedFile, FileContent, RetrievalMode};

#[cfg(test)]
pub use gateway::MockChangeSetGateway;

#[cfg(test)]
mod tests;
