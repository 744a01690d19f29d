//! In-memory query backend for testing and embedded use.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::backend::{QueryBackend, WriteOutcome};
use crate::error::{Error, Result};
use crate::intent::{Comparison, Direction};
use crate::query::{Filter, QuerySpec, Row};

/// In-memory [`QueryBackend`] implementation.
///
/// Plays the role a pooled SQL connection plays in production: rows live
/// in a `Vec` behind a mutex. The size of every insert batch received is
/// recorded so tests can assert chunking behavior and that empty bulk
/// writes never reach the backend.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    rows: Arc<Mutex<Vec<Row>>>,
    insert_batches: Arc<Mutex<Vec<usize>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with `rows`, in order.
    pub fn seeded(rows: Vec<Row>) -> Self {
        MemoryBackend {
            rows: Arc::new(Mutex::new(rows)),
            insert_batches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of all rows, in insertion order.
    pub async fn rows(&self) -> Vec<Row> {
        self.rows.lock().await.clone()
    }

    /// Sizes of the insert batches received so far. Concurrent writers
    /// arrive in completion order, so compare as a multiset.
    pub async fn insert_batches(&self) -> Vec<usize> {
        self.insert_batches.lock().await.clone()
    }
}

#[async_trait]
impl QueryBackend for MemoryBackend {
    async fn select(&self, query: QuerySpec) -> Result<Vec<Row>> {
        let mut selected: Vec<Row> = {
            let rows = self.rows.lock().await;
            rows.iter()
                .filter(|row| matches_all(row, &query.filters))
                .cloned()
                .collect()
        };

        if let Some(order) = &query.order_by {
            selected.sort_by(|a, b| {
                let left = a.get(&order.field).unwrap_or(&Value::Null);
                let right = b.get(&order.field).unwrap_or(&Value::Null);
                let ordering = compare_values(left, right).unwrap_or(Ordering::Equal);
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(offset) = query.offset {
            let offset = (offset as usize).min(selected.len());
            selected.drain(..offset);
        }
        if let Some(limit) = query.limit {
            selected.truncate(limit as usize);
        }
        Ok(selected)
    }

    async fn insert(&self, records: Vec<Row>, skip_return: bool) -> Result<WriteOutcome> {
        self.insert_batches.lock().await.push(records.len());
        self.rows.lock().await.extend(records.iter().cloned());
        if skip_return {
            Ok(WriteOutcome::Count(records.len() as u64))
        } else {
            Ok(WriteOutcome::Rows(records))
        }
    }

    async fn update(&self, criteria: QuerySpec, patch: Row) -> Result<WriteOutcome> {
        let mut rows = self.rows.lock().await;
        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if matches_all(row, &criteria.filters) {
                for (key, value) in &patch {
                    row.insert(key.clone(), value.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(WriteOutcome::Rows(updated))
    }

    async fn delete(&self, criteria: QuerySpec) -> Result<WriteOutcome> {
        let mut rows = self.rows.lock().await;
        let mut deleted = Vec::new();
        rows.retain(|row| {
            if matches_all(row, &criteria.filters) {
                deleted.push(row.clone());
                false
            } else {
                true
            }
        });
        Ok(WriteOutcome::Rows(deleted))
    }

    async fn count(&self, criteria: QuerySpec) -> Result<u64> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|row| matches_all(row, &criteria.filters))
            .count() as u64)
    }

    async fn raw(&self, statement: &str, _params: Vec<Value>) -> Result<Vec<Row>> {
        Err(Error::backend(format!(
            "memory backend cannot execute raw statements (got '{statement}')"
        )))
    }
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| matches(row, filter))
}

fn matches(row: &Row, filter: &Filter) -> bool {
    let field_value = row.get(&filter.field).unwrap_or(&Value::Null);
    let bound = filter.value.as_ref();
    match filter.compare {
        Comparison::Equals => bound.is_some_and(|value| value == field_value),
        Comparison::GreaterThan => ordered(field_value, bound, |o| o == Ordering::Greater),
        Comparison::GreaterOrEqual => ordered(field_value, bound, |o| o != Ordering::Less),
        Comparison::LessThan => ordered(field_value, bound, |o| o == Ordering::Less),
        Comparison::LessOrEqual => ordered(field_value, bound, |o| o != Ordering::Greater),
        Comparison::In => bound
            .and_then(Value::as_array)
            .is_some_and(|set| set.contains(field_value)),
        Comparison::Like => match (field_value, bound.and_then(Value::as_str)) {
            (Value::String(text), Some(pattern)) => like_match(pattern, text),
            _ => false,
        },
        Comparison::IsNull => field_value.is_null(),
        Comparison::IsNotNull => !field_value.is_null(),
    }
}

fn ordered<P>(field_value: &Value, bound: Option<&Value>, accept: P) -> bool
where
    P: Fn(Ordering) -> bool,
{
    bound
        .and_then(|value| compare_values(field_value, value))
        .is_some_and(accept)
}

/// Order two scalar values; incomparable kinds yield `None` and match no
/// range filter, the way mixed-type SQL comparisons come back empty.
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// SQL LIKE: `%` matches any run of characters, `_` matches exactly one.
fn like_match(pattern: &str, text: &str) -> bool {
    fn matches_at(pattern: &[char], text: &[char]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some((&'%', rest)) => {
                (0..=text.len()).any(|skip| matches_at(rest, &text[skip..]))
            }
            Some((&'_', rest)) => text
                .split_first()
                .is_some_and(|(_, text_rest)| matches_at(rest, text_rest)),
            Some((expected, rest)) => text
                .split_first()
                .is_some_and(|(actual, text_rest)| actual == expected && matches_at(rest, text_rest)),
        }
    }
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    matches_at(&pattern, &text)
}
