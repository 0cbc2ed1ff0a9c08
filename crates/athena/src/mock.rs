//! In-memory service implementations for tests.
//!
//! [`MockExecutionService`] walks a scripted sequence of status snapshots and
//! [`MockResultStore`] serves objects from a `HashMap`, so the full
//! submit/poll/download pipeline can be exercised without AWS credentials.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DownloadError, QueryError};
use crate::service::{ExecutionService, ResultStore};
use crate::types::{QueryRequest, QueryState, StatusSnapshot};

// ---------------------------------------------------------------------------
// MockExecutionService
// ---------------------------------------------------------------------------

/// Scripted [`ExecutionService`] for tests.
///
/// Each `status` call pops the next snapshot from the script; the final
/// snapshot repeats once the script is exhausted, so a terminal state stays
/// terminal no matter how often it is polled.
pub struct MockExecutionService {
    script: Mutex<VecDeque<StatusSnapshot>>,
    submit_error: Option<String>,
    execution_id: String,
    status_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    submitted: Mutex<Vec<QueryRequest>>,
}

impl MockExecutionService {
    /// Service that walks the given snapshots in order.
    pub fn with_script(script: Vec<StatusSnapshot>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            submit_error: None,
            execution_id: "mock-execution-1".to_string(),
            status_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Service whose queries succeed on the first poll.
    pub fn succeeding() -> Self {
        Self::with_script(vec![StatusSnapshot::of(QueryState::Succeeded)])
    }

    /// Service that rejects every submission with the given message.
    pub fn rejecting(message: impl Into<String>) -> Self {
        let mut svc = Self::with_script(Vec::new());
        svc.submit_error = Some(message.into());
        svc
    }

    /// Override the execution id handed back by `submit`.
    pub fn with_execution_id(mut self, id: impl Into<String>) -> Self {
        self.execution_id = id.into();
        self
    }

    /// Number of `status` calls made so far.
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Number of `cancel` calls made so far.
    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    /// Every request passed to `submit`, in order.
    pub fn submitted_requests(&self) -> Vec<QueryRequest> {
        self.submitted.lock().unwrap().clone()
    }

    /// Just the SQL strings passed to `submit`, in order.
    pub fn submitted_queries(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.query.clone())
            .collect()
    }
}

#[async_trait]
impl ExecutionService for MockExecutionService {
    async fn submit(&self, request: &QueryRequest) -> Result<String, QueryError> {
        if let Some(message) = &self.submit_error {
            return Err(QueryError::Submission(message.clone()));
        }
        self.submitted.lock().unwrap().push(request.clone());
        Ok(self.execution_id.clone())
    }

    async fn status(&self, _execution_id: &str) -> Result<StatusSnapshot, QueryError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        match script.len() {
            0 => Ok(StatusSnapshot::of(QueryState::Succeeded)),
            1 => Ok(script[0].clone()),
            _ => Ok(script.pop_front().unwrap()),
        }
    }

    async fn cancel(&self, _execution_id: &str) -> Result<(), QueryError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockResultStore
// ---------------------------------------------------------------------------

/// In-memory [`ResultStore`] keyed by `bucket/key`.
pub struct MockResultStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    downloads: AtomicUsize,
    fail_with: Option<String>,
}

impl MockResultStore {
    /// Empty store; every download misses with `NotFound`.
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            downloads: AtomicUsize::new(0),
            fail_with: None,
        }
    }

    /// Store whose downloads all fail with a service error.
    pub fn failing(message: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.fail_with = Some(message.into());
        store
    }

    /// Insert an object body under `bucket/key`.
    pub fn put(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.objects
            .lock()
            .unwrap()
            .insert(format!("{bucket}/{key}"), body.into());
    }

    /// Number of `download` calls made so far.
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl Default for MockResultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for MockResultStore {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), DownloadError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.fail_with {
            return Err(DownloadError::Service {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: message.clone(),
            });
        }

        // Clone out of the lock before awaiting.
        let body = self
            .objects
            .lock()
            .unwrap()
            .get(&format!("{bucket}/{key}"))
            .cloned();

        match body {
            Some(bytes) => {
                tokio::fs::write(dest, bytes).await?;
                Ok(())
            }
            None => Err(DownloadError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
