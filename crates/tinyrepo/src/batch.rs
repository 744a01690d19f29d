//! Chunked, concurrently-executed bulk insert.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde_json::Value;

use crate::backend::{QueryBackend, WriteOutcome};
use crate::error::{Error, Result};
use crate::query::Row;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Options accepted by `createMany`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateManyOptions {
    /// Largest number of records per backend insert. Must be at least 1.
    pub chunk_size: usize,
    /// Return an affected-row count instead of the inserted rows.
    pub skip_return: bool,
}

impl CreateManyOptions {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        CreateManyOptions {
            chunk_size,
            ..CreateManyOptions::default()
        }
    }
}

impl Default for CreateManyOptions {
    fn default() -> Self {
        CreateManyOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_return: false,
        }
    }
}

/// Outcome of a bulk insert: the inserted rows in chunk index order, or
/// the summed affected-row count.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchWriteResult {
    Rows(Vec<Row>),
    Count(u64),
}

impl BatchWriteResult {
    /// Dynamic-surface representation: a row array, or `{"count": n}`.
    pub fn into_value(self) -> Value {
        match self {
            BatchWriteResult::Rows(rows) => {
                Value::Array(rows.into_iter().map(Value::Object).collect())
            }
            BatchWriteResult::Count(count) => serde_json::json!({ "count": count }),
        }
    }
}

/// Bulk insert with chunked, concurrent backend writes.
///
/// Records are partitioned into contiguous chunks of at most
/// `options.chunk_size`, every chunk insert is started before any is
/// awaited, and results reassemble in chunk index order regardless of
/// completion order. A failed chunk surfaces as soon as it is observed;
/// sibling chunk tasks keep running to completion with their results
/// discarded, never cancelled. No transaction spans the chunks: callers
/// needing all-or-nothing semantics must scope one through the backend's
/// transaction collaborator, serializing the chunks in the process.
pub async fn create_many(
    backend: Arc<dyn QueryBackend>,
    records: Vec<Row>,
    options: CreateManyOptions,
) -> Result<BatchWriteResult> {
    if options.chunk_size == 0 {
        return Err(Error::invalid_argument("chunk_size must be at least 1"));
    }
    if records.is_empty() {
        // Nothing to do; the backend is never contacted.
        return Ok(if options.skip_return {
            BatchWriteResult::Count(0)
        } else {
            BatchWriteResult::Rows(Vec::new())
        });
    }

    let total = records.len();
    let chunks = partition(records, options.chunk_size);
    let chunk_count = chunks.len();
    diagnostics::log_debug!("bulk insert of {total} record(s) across {chunks} chunk(s)",
        total: total, chunks: chunk_count);

    // Spawn every chunk before awaiting any, so the backend round-trips
    // overlap. Dropping the join wrappers below detaches the tasks
    // instead of cancelling them.
    let handles: Vec<_> = chunks
        .into_iter()
        .map(|chunk| {
            let backend = backend.clone();
            tokio::spawn(async move { backend.insert(chunk, options.skip_return).await })
        })
        .collect();

    let mut settled: FuturesUnordered<_> = handles
        .into_iter()
        .enumerate()
        .map(|(index, handle)| async move { (index, handle.await) })
        .collect();

    let mut outcomes: Vec<Option<WriteOutcome>> = vec![None; chunk_count];
    while let Some((index, joined)) = settled.next().await {
        let outcome = match joined {
            Ok(result) => result?,
            Err(join_error) => return Err(Error::backend(join_error)),
        };
        outcomes[index] = Some(outcome);
    }

    if options.skip_return {
        let count: u64 = outcomes.iter().flatten().map(WriteOutcome::count).sum();
        Ok(BatchWriteResult::Count(count))
    } else {
        let mut rows = Vec::with_capacity(total);
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                WriteOutcome::Rows(chunk_rows) => rows.extend(chunk_rows),
                WriteOutcome::Count(_) => {
                    return Err(Error::backend(
                        "backend returned a count for a row-returning bulk insert",
                    ));
                }
            }
        }
        Ok(BatchWriteResult::Rows(rows))
    }
}

/// Contiguous chunks of at most `chunk_size`, preserving input order
/// across chunk boundaries.
fn partition(records: Vec<Row>, chunk_size: usize) -> Vec<Vec<Row>> {
    let mut chunks = Vec::with_capacity(records.len().div_ceil(chunk_size));
    let mut remaining = records.into_iter();
    loop {
        let chunk: Vec<Row> = remaining.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }
    chunks
}
