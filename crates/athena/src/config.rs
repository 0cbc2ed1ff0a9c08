use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use minerva_core::config::{
    current_profile, profiled_env_bool, profiled_env_f64, profiled_env_opt, profiled_env_or,
    profiled_env_u64,
};

use crate::error::QueryError;
use crate::fetch::DEFAULT_CHUNK_ROWS;
use crate::watch::PollPolicy;

/// Default S3 output location for query results.
const DEFAULT_OUTPUT_LOCATION: &str = "s3://minerva-athena-results/";

// ── RunnerConfig ─────────────────────────────────────────────────

/// Configuration for the query runner.
///
/// Reads from environment variables with optional profile prefix.
/// When `MINERVA_PROFILE=PROD`, checks `PROD_ATHENA_DATABASE` before `ATHENA_DATABASE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Bucket the service writes result objects into (read side).
    pub results_bucket: String,
    /// S3 path passed to the service as the result output location (write side).
    pub output_location: String,
    /// Database for the execution context and the default query.
    pub database: String,
    /// Table targeted by the default query.
    pub table: String,
    /// AWS region.
    pub region: String,
    /// Workgroup attached to submissions when set.
    pub workgroup: Option<String>,
    /// Initial poll delay in milliseconds.
    pub poll_initial_ms: u64,
    /// Ceiling for the poll delay in milliseconds.
    pub poll_max_ms: u64,
    /// Backoff multiplier applied to the poll delay.
    pub poll_backoff: f64,
    /// Maximum seconds to wait for a terminal state (0 = wait forever).
    pub max_wait_seconds: u64,
    /// Directory result objects are downloaded into.
    pub scratch_dir: PathBuf,
    /// Rows per chunk when parsing result CSVs.
    pub chunk_rows: usize,
    /// Propagate download failures instead of returning an empty table.
    pub strict: bool,
}

impl RunnerConfig {
    /// Build config from environment variables.
    ///
    /// Reads `MINERVA_PROFILE` to determine the profile prefix.
    /// For each key, tries `{PROFILE}_ATHENA_*` first, then `ATHENA_*`.
    /// `ATHENA_REGION` falls back to `AWS_REGION` before using the default.
    pub fn from_env() -> Self {
        Self::from_env_profiled(&current_profile())
    }

    /// Build config for a specific named profile.
    pub fn from_env_profiled(profile: &str) -> Self {
        let region = profiled_env_opt(profile, "ATHENA_REGION")
            .or_else(|| profiled_env_opt(profile, "AWS_REGION"))
            .unwrap_or_else(|| "ap-southeast-1".to_string());

        let scratch_dir = profiled_env_opt(profile, "ATHENA_SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Self {
            results_bucket: profiled_env_or(profile, "ATHENA_RESULTS_BUCKET", ""),
            output_location: profiled_env_or(
                profile,
                "ATHENA_OUTPUT_LOCATION",
                DEFAULT_OUTPUT_LOCATION,
            ),
            database: profiled_env_or(profile, "ATHENA_DATABASE", "default"),
            table: profiled_env_or(profile, "ATHENA_TABLE", ""),
            region,
            workgroup: profiled_env_opt(profile, "ATHENA_WORKGROUP"),
            poll_initial_ms: profiled_env_u64(profile, "ATHENA_POLL_INITIAL_MS", 200),
            poll_max_ms: profiled_env_u64(profile, "ATHENA_POLL_MAX_MS", 2000),
            poll_backoff: profiled_env_f64(profile, "ATHENA_POLL_BACKOFF", 1.5),
            max_wait_seconds: profiled_env_u64(profile, "ATHENA_MAX_WAIT_SECONDS", 300),
            scratch_dir,
            chunk_rows: profiled_env_u64(
                profile,
                "ATHENA_CHUNK_ROWS",
                DEFAULT_CHUNK_ROWS as u64,
            ) as usize,
            strict: profiled_env_bool(profile, "ATHENA_STRICT", false),
        }
    }

    /// Check that the fields every query run needs are present.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.results_bucket.is_empty() {
            return Err(QueryError::Config(
                "ATHENA_RESULTS_BUCKET is not set".into(),
            ));
        }
        if !self.output_location.starts_with("s3://") {
            return Err(QueryError::Config(format!(
                "output location must be an s3:// URI, got {:?}",
                self.output_location,
            )));
        }
        if self.database.is_empty() {
            return Err(QueryError::Config("ATHENA_DATABASE is not set".into()));
        }
        Ok(())
    }

    /// Polling policy derived from the configured knobs.
    pub fn poll_policy(&self) -> PollPolicy {
        let max_wait = if self.max_wait_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.max_wait_seconds))
        };
        PollPolicy {
            initial_interval: Duration::from_millis(self.poll_initial_ms),
            max_interval: Duration::from_millis(self.poll_max_ms),
            backoff: self.poll_backoff,
            max_wait,
            ..PollPolicy::default()
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Runner config:");
        tracing::info!("  region:     {}", self.region);
        tracing::info!("  database:   {}", self.database);
        tracing::info!("  bucket:     {}", self.results_bucket);
        tracing::info!("  output:     {}", self.output_location);
        tracing::info!(
            "  workgroup:  {}",
            self.workgroup.as_deref().unwrap_or("(none)"),
        );
        tracing::info!("  max wait:   {}s", self.max_wait_seconds);
        tracing::info!("  chunk rows: {}", self.chunk_rows);
        tracing::info!("  strict:     {}", self.strict);
    }
}

// ── Tests ────────────────────────────────────────────────────────
