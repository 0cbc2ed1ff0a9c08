//! Tests for RunnerConfig through the public API: environment loading,
//! profile resolution, and validation.

use std::env;
use std::sync::Mutex;
use std::time::Duration;

use minerva_athena::RunnerConfig;

// Env-based tests must run serially to avoid interfering with each other.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Helper: clear all ATHENA_* and profile env vars used by the config.
fn clear_athena_env() {
    let keys = [
        "MINERVA_PROFILE",
        "ATHENA_RESULTS_BUCKET",
        "ATHENA_OUTPUT_LOCATION",
        "ATHENA_DATABASE",
        "ATHENA_TABLE",
        "ATHENA_REGION",
        "ATHENA_WORKGROUP",
        "ATHENA_POLL_INITIAL_MS",
        "ATHENA_POLL_MAX_MS",
        "ATHENA_POLL_BACKOFF",
        "ATHENA_MAX_WAIT_SECONDS",
        "ATHENA_SCRATCH_DIR",
        "ATHENA_CHUNK_ROWS",
        "ATHENA_STRICT",
        "AWS_REGION",
        "TEST_ATHENA_DATABASE",
        "TEST_ATHENA_RESULTS_BUCKET",
        "TEST_ATHENA_REGION",
    ];
    for k in keys {
        env::remove_var(k);
    }
}

#[test]
fn test_config_from_env() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_athena_env();

    env::set_var("ATHENA_RESULTS_BUCKET", "analytics-results");
    env::set_var("ATHENA_OUTPUT_LOCATION", "s3://analytics-results/queries/");
    env::set_var("ATHENA_DATABASE", "analytics");
    env::set_var("ATHENA_TABLE", "events");
    env::set_var("ATHENA_REGION", "us-west-2");
    env::set_var("ATHENA_STRICT", "true");

    let cfg = RunnerConfig::from_env();

    assert_eq!(cfg.results_bucket, "analytics-results");
    assert_eq!(cfg.output_location, "s3://analytics-results/queries/");
    assert_eq!(cfg.database, "analytics");
    assert_eq!(cfg.table, "events");
    assert_eq!(cfg.region, "us-west-2");
    assert!(cfg.strict);
    assert!(cfg.validate().is_ok());

    clear_athena_env();
}

#[test]
fn test_config_profile() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_athena_env();

    // Base config.
    env::set_var("ATHENA_RESULTS_BUCKET", "base-results");
    env::set_var("ATHENA_DATABASE", "base_db");

    // Profiled overrides.
    env::set_var("MINERVA_PROFILE", "TEST");
    env::set_var("TEST_ATHENA_DATABASE", "test_db");
    env::set_var("TEST_ATHENA_REGION", "eu-west-1");

    let cfg = RunnerConfig::from_env();

    // Profiled values win; unprofiled keys still fall through.
    assert_eq!(cfg.database, "test_db");
    assert_eq!(cfg.region, "eu-west-1");
    assert_eq!(cfg.results_bucket, "base-results");

    clear_athena_env();
}

#[test]
fn test_validate_requires_bucket() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_athena_env();

    let cfg = RunnerConfig::from_env();
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("ATHENA_RESULTS_BUCKET"));
}

#[test]
fn test_poll_policy_reflects_config() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_athena_env();

    env::set_var("ATHENA_POLL_INITIAL_MS", "100");
    env::set_var("ATHENA_POLL_MAX_MS", "800");
    env::set_var("ATHENA_MAX_WAIT_SECONDS", "60");

    let policy = RunnerConfig::from_env().poll_policy();

    assert_eq!(policy.initial_interval, Duration::from_millis(100));
    assert_eq!(policy.max_interval, Duration::from_millis(800));
    assert_eq!(policy.max_wait, Some(Duration::from_secs(60)));

    clear_athena_env();
}
