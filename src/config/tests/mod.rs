//! Unit tests for configuration loading and precedence.
//!
//! Tests are organised into modules by functional area:
//! - `helpers`: Shared test utilities
//! - `precedence`: Layer precedence tests
//! - `operation_mode`: Operation mode and review source tests
//! - `field_resolution`: Token, output, and retrieval setting resolution tests

mod helpers;
mod operation_mode;
