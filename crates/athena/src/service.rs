//! Trait seams for the two external collaborators: the query-execution
//! service and the object store holding result blobs.
//!
//! Production code wires in the AWS implementations from [`crate::aws`];
//! tests use the in-memory fakes from [`crate::mock`].

use std::path::Path;

use async_trait::async_trait;

use crate::error::{DownloadError, QueryError};
use crate::types::{QueryRequest, StatusSnapshot};

/// Boundary to the query-execution service.
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Submit a query for asynchronous execution, returning its execution id.
    async fn submit(&self, request: &QueryRequest) -> Result<String, QueryError>;

    /// Fetch the current status of an execution.
    async fn status(&self, execution_id: &str) -> Result<StatusSnapshot, QueryError>;

    /// Request cancellation of a running execution.
    async fn cancel(&self, execution_id: &str) -> Result<(), QueryError>;
}

/// Boundary to the object store holding result blobs.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Download `bucket`/`key` to the given local path.
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), DownloadError>;
}
