use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle states reported by the execution service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    /// Returns `true` for states from which no further transition occurs.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

/// Point-in-time status of one execution.
///
/// `reason` carries the service's state-change explanation and is normally
/// only present for FAILED and CANCELLED.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: QueryState,
    pub reason: Option<String>,
}

impl StatusSnapshot {
    pub fn of(state: QueryState) -> Self {
        Self {
            state,
            reason: None,
        }
    }

    pub fn with_reason(state: QueryState, reason: impl Into<String>) -> Self {
        Self {
            state,
            reason: Some(reason.into()),
        }
    }
}

/// What gets submitted to the execution service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// SQL text to execute.
    pub query: String,
    /// Database for the execution context.
    pub database: String,
    /// `s3://` URI the service writes result objects under.
    pub output_location: String,
    /// Workgroup to run in, when configured.
    pub workgroup: Option<String>,
}

/// Identifier for one submitted query, plus the text it ran.
///
/// The query text rides along so terminal-state errors can quote it without
/// the caller having to track the pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionHandle {
    pub execution_id: String,
    pub query: String,
}

impl ExecutionHandle {
    pub fn new(execution_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            query: query.into(),
        }
    }

    /// Object key of the result CSV the service writes for this execution.
    pub fn result_key(&self) -> String {
        format!("{}.csv", self.execution_id)
    }
}
