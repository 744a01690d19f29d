//! Query construction: filter specs, pagination options, and the
//! composable builder handle.

use std::sync::Arc;

use serde_json::Value;

use crate::backend::QueryBackend;
use crate::error::{Error, Result};
use crate::intent::{Comparison, Direction, OrderBy};

/// A single row as exchanged with the backend.
pub type Row = serde_json::Map<String, Value>;

/// One filter condition bound into a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub compare: Comparison,
    /// Bound value; `None` for the null checks, which bind nothing.
    pub value: Option<Value>,
}

/// A filtered/ordered/paginated read, or the criteria of a write, as
/// handed to the backend. Filters apply left to right in declared order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QuerySpec {
    pub fn filtered(filters: Vec<Filter>) -> Self {
        QuerySpec {
            filters,
            ..QuerySpec::default()
        }
    }

    /// Equality criteria from a JSON object, one filter per key.
    pub fn equality(criteria: &Row) -> Self {
        QuerySpec::filtered(
            criteria
                .iter()
                .map(|(field, value)| Filter {
                    field: field.clone(),
                    compare: Comparison::Equals,
                    value: Some(value.clone()),
                })
                .collect(),
        )
    }
}

/// Trailing pagination options accepted by collection finders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
pub struct QueryOptions {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryOptions {
    /// Structural check used to pop a trailing options argument: a JSON
    /// object carrying a `limit` and/or `offset` key. Extra keys do not
    /// disqualify it; the check is deliberately the literal one the call
    /// surface has always used.
    pub fn matches(value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|map| map.contains_key("limit") || map.contains_key("offset"))
    }

    /// Convert a structurally matching value. Bounds must be non-negative
    /// integers (or null/absent).
    pub fn from_value(value: &Value) -> Result<QueryOptions> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::invalid_argument("query options must be an object"))?;
        Ok(QueryOptions {
            limit: read_bound(map, "limit")?,
            offset: read_bound(map, "offset")?,
        })
    }
}

fn read_bound(map: &Row, key: &str) -> Result<Option<u64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            Error::invalid_argument(format!(
                "query option '{key}' must be a non-negative integer, got {value}"
            ))
        }),
    }
}

/// Composable query handle returned by [`crate::Repository::query`].
///
/// Accumulates a [`QuerySpec`] and executes it against the backend on one
/// of the fetch methods.
#[derive(Clone)]
pub struct QueryBuilder {
    backend: Arc<dyn QueryBackend>,
    spec: QuerySpec,
}

impl QueryBuilder {
    pub(crate) fn new(backend: Arc<dyn QueryBackend>) -> Self {
        QueryBuilder {
            backend,
            spec: QuerySpec::default(),
        }
    }

    /// Add a value-binding filter.
    pub fn filter<F, V>(mut self, field: F, compare: Comparison, value: V) -> Self
    where
        F: Into<String>,
        V: Into<Value>,
    {
        self.spec.filters.push(Filter {
            field: field.into(),
            compare,
            value: Some(value.into()),
        });
        self
    }

    /// Add an `IS NULL` filter.
    pub fn filter_null<F: Into<String>>(self, field: F) -> Self {
        self.filter_unbound(field, Comparison::IsNull)
    }

    /// Add an `IS NOT NULL` filter.
    pub fn filter_not_null<F: Into<String>>(self, field: F) -> Self {
        self.filter_unbound(field, Comparison::IsNotNull)
    }

    fn filter_unbound<F: Into<String>>(mut self, field: F, compare: Comparison) -> Self {
        self.spec.filters.push(Filter {
            field: field.into(),
            compare,
            value: None,
        });
        self
    }

    pub fn order_by<F: Into<String>>(mut self, field: F, direction: Direction) -> Self {
        self.spec.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.spec.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.spec.offset = Some(offset);
        self
    }

    /// The spec accumulated so far.
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Execute and return every matching row.
    pub async fn fetch_all(self) -> Result<Vec<Row>> {
        self.backend.select(self.spec).await
    }

    /// Execute with `limit 1` and return the first matching row, if any.
    pub async fn fetch_one(mut self) -> Result<Option<Row>> {
        self.spec.limit = Some(1);
        Ok(self.backend.select(self.spec).await?.into_iter().next())
    }

    /// Count matching rows. Ordering and pagination do not apply.
    pub async fn count(self) -> Result<u64> {
        let criteria = QuerySpec::filtered(self.spec.filters);
        self.backend.count(criteria).await
    }
}
