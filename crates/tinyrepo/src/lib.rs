#![allow(tail_expr_drop_order)]
#![allow(missing_docs)]

//! TinyRepo - derived-finder query engine over an abstract relational backend
//!
//! Method names that were never declared, like `findAllByStatusOrderByNameDesc`,
//! are parsed at call time into structured query intent and executed against a
//! pluggable [`QueryBackend`]. Parses are memoized per repository handle, and
//! bulk inserts fan out over concurrent backend chunks.
//!
//! Set the TINYREPO_LOG environment variable to control logging:
//! - TINYREPO_LOG=off (default) - silent
//! - TINYREPO_LOG=info - basic operations
//! - TINYREPO_LOG=debug - dispatch and cache diagnostics

// The abstract backend seam
pub mod backend;

// Chunked concurrent bulk insert
pub mod batch;

// Memoization of method-name parses
pub mod cache;

// Name classification: fixed operation or derived finder
pub mod dispatch;

// Error types
pub mod error;

// Identifier normalization
pub mod ident;

// Method-name grammar
pub mod intent;

// In-memory backend (tests, embedded use)
pub mod memory;

// Query specs, options, and the composable builder
pub mod query;

// The repository handle
pub mod repository;

// Re-export key types
pub use backend::{QueryBackend, WriteOutcome};
pub use batch::{BatchWriteResult, CreateManyOptions, DEFAULT_CHUNK_SIZE};
pub use cache::IntentCache;
pub use dispatch::{BaseOperation, Dispatch, resolve};
pub use error::{Error, Result};
pub use ident::normalize;
pub use intent::{Arity, Comparison, Direction, MethodIntent, OrderBy, Predicate};
pub use memory::MemoryBackend;
pub use query::{Filter, QueryBuilder, QueryOptions, QuerySpec, Row};
pub use repository::{Repository, RepositoryOptions};

#[cfg(test)]
mod tests;
