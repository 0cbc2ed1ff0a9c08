pub mod config;
pub mod error;
pub mod types;
pub mod service;
pub mod aws;
pub mod watch;
pub mod fetch;
pub mod runner;
pub mod records;
pub mod parquet;
pub mod mock;

pub use config::RunnerConfig;
pub use error::{DownloadError, QueryError};
pub use types::{ExecutionHandle, QueryRequest, QueryState, StatusSnapshot};
pub use service::{ExecutionService, ResultStore};
pub use aws::{AthenaExecutionService, S3ResultStore};
pub use watch::PollPolicy;
pub use fetch::{identity_transform, ChunkTransform, Fetched, DEFAULT_CHUNK_ROWS};
pub use runner::QueryRunner;
pub use records::to_json_records;
pub use parquet::{table_to_record_batch, write_parquet, write_parquet_bytes, ParquetError};
pub use mock::{MockExecutionService, MockResultStore};
