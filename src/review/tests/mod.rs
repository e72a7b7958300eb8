//! Unit tests for the review harvesting module.
