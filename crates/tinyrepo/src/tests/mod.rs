mod dispatching;

use serde_json::Value;

use crate::query::Row;

/// Build a row from key/value pairs.
pub(crate) fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}
