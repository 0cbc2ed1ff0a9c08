//! The query runner: submit, wait, fetch, assemble.
//!
//! [`QueryRunner`] chains the three stages behind one surface. The service
//! boundaries are injected as trait objects, so the same runner drives real
//! AWS clients in production and the in-memory fakes in tests.

use std::sync::Arc;

use tracing::{info, warn};

use minerva_core::Table;

use crate::aws::{load_aws_config, AthenaExecutionService, S3ResultStore};
use crate::config::RunnerConfig;
use crate::error::{DownloadError, QueryError};
use crate::fetch::{self, ChunkTransform, Fetched};
use crate::service::{ExecutionService, ResultStore};
use crate::types::{ExecutionHandle, QueryRequest};
use crate::watch::{self, PollPolicy};

/// Submits queries, waits for completion, and assembles result tables.
pub struct QueryRunner {
    config: RunnerConfig,
    service: Arc<dyn ExecutionService>,
    store: Arc<dyn ResultStore>,
    policy: PollPolicy,
    transform: ChunkTransform,
}

impl QueryRunner {
    /// Build a runner against real AWS clients.
    ///
    /// Validates the config, loads the shared SDK config for the configured
    /// region, and wires in the Athena and S3 implementations.
    pub async fn connect(config: RunnerConfig) -> Result<Self, QueryError> {
        config.validate()?;

        let sdk_config = load_aws_config(&config.region).await;
        let service = Arc::new(AthenaExecutionService::new(&sdk_config));
        let store = Arc::new(S3ResultStore::new(&sdk_config));

        info!(
            region = %config.region,
            database = %config.database,
            bucket = %config.results_bucket,
            "QueryRunner initialised"
        );

        Ok(Self::with_clients(config, service, store))
    }

    /// Build a runner with injected service implementations.
    pub fn with_clients(
        config: RunnerConfig,
        service: Arc<dyn ExecutionService>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        let policy = config.poll_policy();
        Self {
            config,
            service,
            store,
            policy,
            transform: fetch::identity_transform(),
        }
    }

    /// Replace the per-chunk transform (default: identity).
    pub fn with_transform(mut self, transform: ChunkTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Replace the polling policy (default: derived from the config).
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Pipeline stages
    // -----------------------------------------------------------------------

    /// Submit `query` for asynchronous execution.
    pub async fn submit(&self, query: &str) -> Result<ExecutionHandle, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let request = QueryRequest {
            query: query.to_string(),
            database: self.config.database.clone(),
            output_location: self.config.output_location.clone(),
            workgroup: self.config.workgroup.clone(),
        };

        info!(database = %request.database, "Submitting query");
        let execution_id = self.service.submit(&request).await?;
        info!(execution_id = %execution_id, "Execution started");

        Ok(ExecutionHandle::new(execution_id, query))
    }

    /// Poll until `handle` reaches a terminal state.
    ///
    /// Returns the handle unchanged on success; FAILED and CANCELLED become
    /// errors quoting the query text and the service's reason.
    pub async fn await_completion(
        &self,
        handle: &ExecutionHandle,
    ) -> Result<ExecutionHandle, QueryError> {
        watch::watch(self.service.as_ref(), handle, &self.policy).await
    }

    /// Download and assemble the result table for a completed execution.
    ///
    /// By default a missing result object or a failed download yields an
    /// empty table (logged); with `strict` set in the config, both become
    /// errors. CSV parse errors propagate in either mode.
    pub async fn fetch_and_assemble(
        &self,
        handle: &ExecutionHandle,
    ) -> Result<Table, QueryError> {
        let fetched = fetch::fetch_result(
            self.store.as_ref(),
            handle,
            &self.config.results_bucket,
            &self.config.scratch_dir,
            self.config.chunk_rows,
            &self.transform,
        )
        .await;

        match fetched {
            Ok(Fetched::Table(table)) => Ok(table),
            Ok(Fetched::Missing) => {
                if self.config.strict {
                    Err(QueryError::Download(DownloadError::NotFound {
                        bucket: self.config.results_bucket.clone(),
                        key: handle.result_key(),
                    }))
                } else {
                    info!(
                        execution_id = %handle.execution_id,
                        "No result object, returning empty table"
                    );
                    Ok(Table::default())
                }
            }
            Err(QueryError::Download(e)) if !self.config.strict => {
                warn!(
                    execution_id = %handle.execution_id,
                    error = %e,
                    "Download failed, returning empty table"
                );
                Ok(Table::default())
            }
            Err(e) => Err(e),
        }
    }

    // -----------------------------------------------------------------------
    // Orchestration
    // -----------------------------------------------------------------------

    /// Run `query` end to end: submit, wait, fetch, assemble.
    pub async fn run_query(&self, query: &str) -> Result<Table, QueryError> {
        let handle = self.submit(query).await?;
        let handle = self.await_completion(&handle).await?;
        self.fetch_and_assemble(&handle).await
    }

    /// Run a `LIMIT 10` preview of the configured database and table.
    pub async fn run_default_query(&self) -> Result<Table, QueryError> {
        if self.config.table.is_empty() {
            return Err(QueryError::Config(
                "ATHENA_TABLE is not set, cannot build the default query".into(),
            ));
        }
        let query = format!(
            "SELECT * FROM {}.{} LIMIT 10",
            self.config.database, self.config.table,
        );
        self.run_query(&query).await
    }

    /// Request cancellation of a running execution.
    pub async fn cancel(&self, handle: &ExecutionHandle) -> Result<(), QueryError> {
        self.service.cancel(&handle.execution_id).await
    }
}
