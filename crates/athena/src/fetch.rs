//! Result fetching and chunked CSV assembly.
//!
//! The result object is downloaded to a scratch file, parsed in bounded-size
//! row chunks, run through a per-chunk transform, and concatenated in read
//! order. The scratch file is removed on every exit path, parse failures
//! included.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use minerva_core::Table;

use crate::error::{DownloadError, QueryError};
use crate::service::ResultStore;
use crate::types::ExecutionHandle;

/// Rows per chunk when none is configured.
pub const DEFAULT_CHUNK_ROWS: usize = 10_000_000;

/// Per-chunk rewrite applied between parsing and assembly.
pub type ChunkTransform = Arc<dyn Fn(Table) -> Table + Send + Sync>;

/// The default transform: chunks pass through untouched.
pub fn identity_transform() -> ChunkTransform {
    Arc::new(|chunk| chunk)
}

/// Outcome of fetching a result object.
#[derive(Debug)]
pub enum Fetched {
    /// The object existed and parsed into a table.
    Table(Table),
    /// The object was not present in the store.
    Missing,
}

/// Deletes the underlying file when dropped.
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove scratch file"
                );
            }
        }
    }
}

/// Download the result object for `handle` and assemble it into a table.
///
/// A missing object is reported as [`Fetched::Missing`] rather than an
/// error; how to treat that is the caller's call. Malformed CSV content
/// always propagates, after the scratch file has been removed.
pub async fn fetch_result(
    store: &dyn ResultStore,
    handle: &ExecutionHandle,
    bucket: &str,
    scratch_dir: &Path,
    chunk_rows: usize,
    transform: &ChunkTransform,
) -> Result<Fetched, QueryError> {
    let key = handle.result_key();
    let scratch = ScratchFile::new(scratch_dir.join(&key));

    match store.download(bucket, &key, scratch.path()).await {
        Ok(()) => {}
        Err(DownloadError::NotFound { .. }) => {
            info!(bucket = %bucket, key = %key, "Result object not found");
            return Ok(Fetched::Missing);
        }
        Err(e) => return Err(e.into()),
    }

    let table = assemble_csv(scratch.path(), chunk_rows, transform)?;

    debug!(
        execution_id = %handle.execution_id,
        rows = table.row_count(),
        columns = table.column_count(),
        "Assembled result table"
    );
    Ok(Fetched::Table(table))
}

/// Parse a CSV file into one table, at most `chunk_rows` rows at a time.
///
/// The first row names the columns. Empty fields become NULL. Each full
/// chunk is passed through `transform` before concatenation, so peak memory
/// tracks the chunk size plus the assembled output rather than twice the
/// file size.
pub fn assemble_csv(
    path: &Path,
    chunk_rows: usize,
    transform: &ChunkTransform,
) -> Result<Table, QueryError> {
    let chunk_rows = chunk_rows.max(1);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut parts: Vec<Table> = Vec::new();
    let mut chunk = Table::new(columns.clone());

    for record in reader.records() {
        let record = record?;
        let row: Vec<Option<String>> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    None
                } else {
                    Some(field.to_string())
                }
            })
            .collect();
        chunk.push_row(row)?;

        if chunk.row_count() >= chunk_rows {
            let full = std::mem::replace(&mut chunk, Table::new(columns.clone()));
            parts.push(transform(full));
        }
    }

    // Final partial chunk. Also taken when the file had no data rows at all,
    // so the header still comes through.
    if !chunk.is_empty() || parts.is_empty() {
        parts.push(transform(chunk));
    }

    Ok(Table::concat(parts)?)
}
