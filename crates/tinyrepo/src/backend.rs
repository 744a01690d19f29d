//! The abstract query backend a repository handle executes against.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::query::{QuerySpec, Row};

/// Result of a write operation: the affected rows, or just how many.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Rows(Vec<Row>),
    Count(u64),
}

impl WriteOutcome {
    /// Affected-row count regardless of representation.
    pub fn count(&self) -> u64 {
        match self {
            WriteOutcome::Rows(rows) => rows.len() as u64,
            WriteOutcome::Count(count) => *count,
        }
    }
}

/// Backend for one entity binding.
///
/// Connection pooling, statement preparation, timeouts, and transaction
/// scoping all live behind this seam; the engine only describes queries
/// and hands them over. Backend failures propagate through unmodified.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Execute a filtered/ordered/paginated read.
    async fn select(&self, query: QuerySpec) -> Result<Vec<Row>>;

    /// Insert `records` in order. Returns the inserted rows unless
    /// `skip_return` asks for an affected-row count instead.
    async fn insert(&self, records: Vec<Row>, skip_return: bool) -> Result<WriteOutcome>;

    /// Update every row matching `criteria` with the fields in `patch`.
    async fn update(&self, criteria: QuerySpec, patch: Row) -> Result<WriteOutcome>;

    /// Delete every row matching `criteria`.
    async fn delete(&self, criteria: QuerySpec) -> Result<WriteOutcome>;

    /// Count rows matching `criteria`.
    async fn count(&self, criteria: QuerySpec) -> Result<u64>;

    /// Escape hatch: execute an arbitrary prepared statement with
    /// positional parameters.
    async fn raw(&self, statement: &str, params: Vec<Value>) -> Result<Vec<Row>>;
}
