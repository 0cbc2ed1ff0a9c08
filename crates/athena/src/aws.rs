//! AWS-backed implementations of the service boundaries.
//!
//! [`AthenaExecutionService`] drives query executions through the Athena
//! control plane; [`S3ResultStore`] pulls the result CSVs Athena writes to
//! S3. Credentials come from the default provider chain.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_athena::types::QueryExecutionState;
use aws_types::region::Region;
use tracing::{debug, info};

use crate::error::{DownloadError, QueryError};
use crate::service::{ExecutionService, ResultStore};
use crate::types::{QueryRequest, QueryState, StatusSnapshot};

/// Load a shared AWS SDK config for the given region.
pub async fn load_aws_config(region: &str) -> aws_config::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

// ---------------------------------------------------------------------------
// Athena
// ---------------------------------------------------------------------------

/// [`ExecutionService`] backed by AWS Athena.
pub struct AthenaExecutionService {
    client: aws_sdk_athena::Client,
}

impl AthenaExecutionService {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_athena::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ExecutionService for AthenaExecutionService {
    async fn submit(&self, request: &QueryRequest) -> Result<String, QueryError> {
        let mut builder = self
            .client
            .start_query_execution()
            .query_string(&request.query)
            .query_execution_context({
                let mut ctx = aws_sdk_athena::types::QueryExecutionContext::builder();
                if !request.database.is_empty() {
                    ctx = ctx.database(&request.database);
                }
                ctx.build()
            })
            .result_configuration(
                aws_sdk_athena::types::ResultConfiguration::builder()
                    .output_location(&request.output_location)
                    .build(),
            );

        if let Some(workgroup) = &request.workgroup {
            builder = builder.work_group(workgroup);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| QueryError::Submission(e.to_string()))?;

        let execution_id = resp
            .query_execution_id()
            .ok_or_else(|| QueryError::Submission("No query execution ID returned".into()))?
            .to_string();

        Ok(execution_id)
    }

    async fn status(&self, execution_id: &str) -> Result<StatusSnapshot, QueryError> {
        let resp = self
            .client
            .get_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
            .map_err(|e| QueryError::Sdk(e.to_string()))?;

        let qe = resp
            .query_execution()
            .ok_or_else(|| QueryError::Sdk("No query execution in response".into()))?;

        let status = qe.status();
        let state = match status.and_then(|s| s.state()) {
            Some(QueryExecutionState::Succeeded) => QueryState::Succeeded,
            Some(QueryExecutionState::Failed) => QueryState::Failed,
            Some(QueryExecutionState::Cancelled) => QueryState::Cancelled,
            Some(QueryExecutionState::Running) => QueryState::Running,
            // Queued, or a variant this SDK version does not know.
            _ => QueryState::Queued,
        };
        let reason = status
            .and_then(|s| s.state_change_reason())
            .map(|r| r.to_string());

        Ok(StatusSnapshot { state, reason })
    }

    async fn cancel(&self, execution_id: &str) -> Result<(), QueryError> {
        info!(execution_id = %execution_id, "Cancelling execution");

        self.client
            .stop_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
            .map_err(|e| QueryError::Sdk(e.to_string()))?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// S3
// ---------------------------------------------------------------------------

/// [`ResultStore`] backed by S3.
pub struct S3ResultStore {
    client: aws_sdk_s3::Client,
}

impl S3ResultStore {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ResultStore for S3ResultStore {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), DownloadError> {
        debug!(
            bucket = %bucket,
            key = %key,
            dest = %dest.display(),
            "Downloading result object"
        );

        let resp = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    return Err(DownloadError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    });
                }
                return Err(DownloadError::Service {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    message: service_err.to_string(),
                });
            }
        };

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| DownloadError::Service {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })?;

        tokio::fs::write(dest, body.into_bytes()).await?;
        Ok(())
    }
}
