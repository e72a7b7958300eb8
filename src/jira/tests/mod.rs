//! Unit tests for Jira epic mode.
