//! Integration tests for the minerva-athena crate.
//!
//! These tests drive the submit/poll/download pipeline against in-memory
//! service implementations, without requiring AWS credentials. Tests marked
//! with `#[ignore]` require AWS credentials and must be run explicitly.

mod config;
mod fetch;
mod watch;
