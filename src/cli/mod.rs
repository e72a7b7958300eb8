//! CLI operation mode handlers.
//!
//! - [`review_batch`]: GitHub pull requests and GitLab merge requests or
//!   commits, from one URL or a URL list file
//! - [`jira_epic`]: merge requests linked from a Jira epic
//!
//! Console rendering is in [`output`].

pub mod jira_epic;
pub mod output;
pub mod review_batch;
