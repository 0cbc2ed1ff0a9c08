use thiserror::Error;

use crate::types::QueryState;

/// Errors from fetching a result object out of the blob store.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The result object does not exist at the expected key.
    #[error("Result object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The store rejected or failed the request.
    #[error("Store error for s3://{bucket}/{key}: {message}")]
    Service {
        bucket: String,
        key: String,
        message: String,
    },

    /// Local filesystem error while writing the downloaded object.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while running a query end to end.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query text was empty or all whitespace.
    #[error("Query text is empty")]
    EmptyQuery,

    /// The runner configuration is incomplete.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The service rejected or could not accept the submission.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// The execution reached FAILED or CANCELLED.
    #[error("Query \"{query}\" stopped with status {state}: {reason}")]
    ExecutionFailed {
        query: String,
        state: QueryState,
        reason: String,
    },

    /// The execution did not reach a terminal state within the wait budget.
    #[error("Execution {execution_id} timed out after {waited_seconds}s")]
    Timeout {
        execution_id: String,
        waited_seconds: u64,
    },

    /// Fetching the result object failed.
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    /// The result object was not valid CSV.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table error: {0}")]
    Core(#[from] minerva_core::CoreError),

    /// An AWS SDK error (stringified).
    #[error("AWS SDK error: {0}")]
    Sdk(String),
}
