//! The repository handle: fixed operations and dynamic dispatch.

use std::sync::Arc;

use serde_json::Value;

use crate::backend::{QueryBackend, WriteOutcome};
use crate::batch::{self, BatchWriteResult, CreateManyOptions};
use crate::cache::IntentCache;
use crate::dispatch::{self, BaseOperation, Dispatch};
use crate::error::{Error, Result};
use crate::intent::{Arity, Comparison, MethodIntent};
use crate::query::{Filter, QueryBuilder, QueryOptions, QuerySpec, Row};

/// Construction-time configuration for a repository handle.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RepositoryOptions {
    /// Column holding the primary key, used by the id-based operations.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Default chunk size for bulk inserts.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_primary_key() -> String {
    "id".to_string()
}

fn default_chunk_size() -> usize {
    batch::DEFAULT_CHUNK_SIZE
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        RepositoryOptions {
            primary_key: default_primary_key(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// One call surface over one entity binding.
///
/// Owns the intent cache, so parsed finders live as long as the handle
/// and never leak across unrelated bindings. Clones share the backend,
/// options, and cache.
#[derive(Clone)]
pub struct Repository {
    backend: Arc<dyn QueryBackend>,
    options: Arc<RepositoryOptions>,
    cache: Arc<IntentCache>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("options", &self.options)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Repository {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Repository {
        Repository {
            backend,
            options: Arc::new(RepositoryOptions::default()),
            cache: Arc::new(IntentCache::new()),
        }
    }

    /// Construct with explicit options, validating them up front.
    pub fn with_options(
        backend: Arc<dyn QueryBackend>,
        options: RepositoryOptions,
    ) -> Result<Repository> {
        if options.primary_key.is_empty() {
            return Err(Error::invalid_argument("primary_key must not be empty"));
        }
        if options.chunk_size == 0 {
            return Err(Error::invalid_argument("chunk_size must be at least 1"));
        }
        diagnostics::log_info!("repository handle created with primary key {pk}",
            pk: options.primary_key);
        Ok(Repository {
            backend,
            options: Arc::new(options),
            cache: Arc::new(IntentCache::new()),
        })
    }

    fn id_criteria(&self, id: Value) -> QuerySpec {
        QuerySpec::filtered(vec![Filter {
            field: self.options.primary_key.clone(),
            compare: Comparison::Equals,
            value: Some(id),
        }])
    }

    // -- Fixed operations -------------------------------------------------

    pub async fn find_all(&self) -> Result<Vec<Row>> {
        self.backend.select(QuerySpec::default()).await
    }

    pub async fn find_by_id(&self, id: Value) -> Result<Option<Row>> {
        let mut spec = self.id_criteria(id);
        spec.limit = Some(1);
        Ok(self.backend.select(spec).await?.into_iter().next())
    }

    pub async fn create(&self, record: Row) -> Result<Row> {
        match self.backend.insert(vec![record], false).await? {
            WriteOutcome::Rows(rows) => rows
                .into_iter()
                .next()
                .ok_or_else(|| Error::backend("insert returned no row")),
            WriteOutcome::Count(_) => Err(Error::backend(
                "insert returned a count where a row was expected",
            )),
        }
    }

    /// Patch the row with the given primary key; `None` when no row has it.
    pub async fn update(&self, id: Value, patch: Row) -> Result<Option<Row>> {
        match self.backend.update(self.id_criteria(id), patch).await? {
            WriteOutcome::Rows(rows) => Ok(rows.into_iter().next()),
            WriteOutcome::Count(_) => Ok(None),
        }
    }

    /// Delete the row with the given primary key; `None` when no row has it.
    pub async fn delete(&self, id: Value) -> Result<Option<Row>> {
        match self.backend.delete(self.id_criteria(id)).await? {
            WriteOutcome::Rows(rows) => Ok(rows.into_iter().next()),
            WriteOutcome::Count(_) => Ok(None),
        }
    }

    /// Update when the record carries a non-null primary key, create
    /// otherwise.
    pub async fn save(&self, mut record: Row) -> Result<Option<Row>> {
        let id = match record.get(&self.options.primary_key) {
            Some(value) if !value.is_null() => Some(value.clone()),
            _ => None,
        };
        match id {
            Some(id) => {
                record.remove(&self.options.primary_key);
                self.update(id, record).await
            }
            None => self.create(record).await.map(Some),
        }
    }

    /// Bulk insert; see [`batch::create_many`] for the chunking and
    /// concurrency contract. `None` options use the handle's defaults.
    pub async fn create_many(
        &self,
        records: Vec<Row>,
        options: Option<CreateManyOptions>,
    ) -> Result<BatchWriteResult> {
        let options =
            options.unwrap_or_else(|| CreateManyOptions::with_chunk_size(self.options.chunk_size));
        batch::create_many(self.backend.clone(), records, options).await
    }

    /// Patch every row matching the equality criteria; returns the
    /// affected-row count.
    pub async fn update_many(&self, criteria: &Row, patch: Row) -> Result<u64> {
        let outcome = self
            .backend
            .update(QuerySpec::equality(criteria), patch)
            .await?;
        Ok(outcome.count())
    }

    /// Delete every row matching the equality criteria; returns the
    /// affected-row count.
    pub async fn delete_many(&self, criteria: &Row) -> Result<u64> {
        let outcome = self.backend.delete(QuerySpec::equality(criteria)).await?;
        Ok(outcome.count())
    }

    pub async fn count(&self, criteria: Option<&Row>) -> Result<u64> {
        let spec = criteria.map(QuerySpec::equality).unwrap_or_default();
        self.backend.count(spec).await
    }

    pub async fn exists(&self, criteria: Option<&Row>) -> Result<bool> {
        Ok(self.count(criteria).await? > 0)
    }

    /// Composable query handle over the same backend.
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.backend.clone())
    }

    // -- Dynamic dispatch -------------------------------------------------

    /// The single dynamic entry point: route `name` plus positional
    /// `args` to a fixed operation or a derived finder.
    pub async fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        let target = dispatch::resolve(&self.cache, name)?;
        let argc = args.len();
        diagnostics::log_debug!("dispatching {method} with {argc} argument(s)",
            method: name, argc: argc);
        match target {
            Dispatch::Base(operation) => self.invoke_base(operation, name, args).await,
            Dispatch::Finder(intent) => self.invoke_finder(name, &intent, args).await,
        }
    }

    async fn invoke_base(
        &self,
        operation: BaseOperation,
        name: &str,
        mut args: Vec<Value>,
    ) -> Result<Value> {
        match operation {
            BaseOperation::FindAll => {
                expect_args(name, &args, 0)?;
                Ok(rows_value(self.find_all().await?))
            }
            BaseOperation::FindById => {
                expect_args(name, &args, 1)?;
                let id = take(&mut args);
                Ok(row_value(self.find_by_id(id).await?))
            }
            BaseOperation::Create => {
                expect_args(name, &args, 1)?;
                let record = into_row(name, take(&mut args), "the record")?;
                Ok(Value::Object(self.create(record).await?))
            }
            BaseOperation::Update => {
                expect_args(name, &args, 2)?;
                let id = take(&mut args);
                let patch = into_row(name, take(&mut args), "the patch")?;
                Ok(row_value(self.update(id, patch).await?))
            }
            BaseOperation::Delete => {
                expect_args(name, &args, 1)?;
                let id = take(&mut args);
                Ok(row_value(self.delete(id).await?))
            }
            BaseOperation::Save => {
                expect_args(name, &args, 1)?;
                let record = into_row(name, take(&mut args), "the record")?;
                Ok(row_value(self.save(record).await?))
            }
            BaseOperation::CreateMany => {
                if args.is_empty() || args.len() > 2 {
                    return Err(Error::argument_count_mismatch(name, 1, args.len()));
                }
                let options = if args.len() == 2 {
                    let value = args.pop().unwrap_or(Value::Null);
                    Some(self.parse_create_many_options(&value)?)
                } else {
                    None
                };
                let records = into_records(name, take(&mut args))?;
                Ok(self.create_many(records, options).await?.into_value())
            }
            BaseOperation::UpdateMany => {
                expect_args(name, &args, 2)?;
                let criteria = into_row(name, take(&mut args), "the criteria")?;
                let patch = into_row(name, take(&mut args), "the patch")?;
                let count = self.update_many(&criteria, patch).await?;
                Ok(serde_json::json!({ "count": count }))
            }
            BaseOperation::DeleteMany => {
                expect_args(name, &args, 1)?;
                let criteria = into_row(name, take(&mut args), "the criteria")?;
                let count = self.delete_many(&criteria).await?;
                Ok(serde_json::json!({ "count": count }))
            }
            BaseOperation::Count => {
                let criteria = optional_criteria(name, args)?;
                let count = self.count(criteria.as_ref()).await?;
                Ok(Value::from(count))
            }
            BaseOperation::Exists => {
                let criteria = optional_criteria(name, args)?;
                Ok(Value::Bool(self.exists(criteria.as_ref()).await?))
            }
            BaseOperation::Query => Err(Error::invalid_argument(
                "query returns a builder handle and cannot be dispatched dynamically; \
                 call Repository::query() on the typed surface",
            )),
        }
    }

    fn parse_create_many_options(&self, value: &Value) -> Result<CreateManyOptions> {
        #[derive(serde::Deserialize, Default)]
        #[serde(rename_all = "camelCase")]
        struct Given {
            #[serde(default)]
            chunk_size: Option<usize>,
            #[serde(default)]
            skip_return: Option<bool>,
        }
        let given: Given = serde_json::from_value(value.clone())
            .map_err(|e| Error::invalid_argument(format!("bad createMany options: {e}")))?;
        Ok(CreateManyOptions {
            chunk_size: given.chunk_size.unwrap_or(self.options.chunk_size),
            skip_return: given.skip_return.unwrap_or(false),
        })
    }

    async fn invoke_finder(
        &self,
        name: &str,
        intent: &MethodIntent,
        mut args: Vec<Value>,
    ) -> Result<Value> {
        // Collection finders accept a trailing pagination-options value.
        let mut options = QueryOptions::default();
        if intent.arity == Arity::Collection
            && args.last().is_some_and(QueryOptions::matches)
        {
            if let Some(last) = args.pop() {
                options = QueryOptions::from_value(&last)?;
            }
        }

        let expected = intent
            .predicates
            .iter()
            .filter(|p| p.compare.takes_value())
            .count();
        if args.len() != expected {
            return Err(Error::argument_count_mismatch(name, expected, args.len()));
        }

        // Bind positional values to value-taking predicates, in order.
        let mut values = args.into_iter();
        let filters = intent
            .predicates
            .iter()
            .map(|predicate| Filter {
                field: predicate.field.clone(),
                compare: predicate.compare,
                value: if predicate.compare.takes_value() {
                    values.next()
                } else {
                    None
                },
            })
            .collect();

        let mut spec = QuerySpec {
            filters,
            order_by: intent.ordering.clone(),
            limit: options.limit,
            offset: options.offset,
        };

        match intent.arity {
            Arity::Single => {
                spec.limit = Some(1);
                let row = self.backend.select(spec).await?.into_iter().next();
                Ok(row_value(row))
            }
            Arity::Collection => Ok(rows_value(self.backend.select(spec).await?)),
        }
    }
}

fn expect_args(name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::argument_count_mismatch(name, expected, args.len()));
    }
    Ok(())
}

/// Pop the first argument. Callers validate the count first.
fn take(args: &mut Vec<Value>) -> Value {
    if args.is_empty() {
        Value::Null
    } else {
        args.remove(0)
    }
}

fn into_row(name: &str, value: Value, what: &str) -> Result<Row> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::invalid_argument(format!(
            "'{name}' expects {what} to be an object, got {other}"
        ))),
    }
}

fn into_records(name: &str, value: Value) -> Result<Vec<Row>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| into_row(name, item, "each record"))
            .collect(),
        other => Err(Error::invalid_argument(format!(
            "'{name}' expects an array of records, got {other}"
        ))),
    }
}

fn optional_criteria(name: &str, mut args: Vec<Value>) -> Result<Option<Row>> {
    match args.len() {
        0 => Ok(None),
        1 => into_row(name, take(&mut args), "the criteria").map(Some),
        received => Err(Error::argument_count_mismatch(name, 1, received)),
    }
}

fn row_value(row: Option<Row>) -> Value {
    row.map(Value::Object).unwrap_or(Value::Null)
}

fn rows_value(rows: Vec<Row>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}
