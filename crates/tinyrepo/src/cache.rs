//! Memoization of method-name parses.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use crate::intent::MethodIntent;

/// Append-only cache of parsed finder intents, keyed by the literal
/// method-name string.
///
/// Entries are pure functions of their key, so two callers racing on the
/// same miss may both parse; the first insert wins and the loser's work
/// is discarded. Nothing is ever evicted: the key space is bounded by the
/// distinct method names a program actually invokes, not by call volume.
#[derive(Debug, Default)]
pub struct IntentCache {
    entries: RwLock<HashMap<String, Arc<MethodIntent>>>,
}

impl IntentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `name` on first sight, reuse the stored intent afterwards.
    ///
    /// Parse failures are returned but not cached; they stay cheap to
    /// recompute and a repeated bad name is a programmer error anyway.
    pub fn resolve(&self, name: &str) -> Result<Arc<MethodIntent>> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(intent) = entries.get(name) {
                diagnostics::log_debug!("intent cache hit for {method}", method: name);
                return Ok(intent.clone());
            }
        }

        let parsed = Arc::new(MethodIntent::parse(name)?);
        diagnostics::log_debug!("intent cache miss for {method}, parsed", method: name);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let intent = entries
            .entry(name.to_string())
            .or_insert(parsed)
            .clone();
        Ok(intent)
    }

    /// Number of distinct names resolved so far.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Arity;

    #[test]
    fn repeated_resolution_reuses_the_parse() {
        let cache = IntentCache::new();
        let first = cache.resolve("findByEmail").unwrap();
        let second = cache.resolve("findByEmail").unwrap();
        // Same allocation, not merely an equal value.
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_names_get_distinct_entries() {
        let cache = IntentCache::new();
        let single = cache.resolve("findByEmail").unwrap();
        let collection = cache.resolve("findAllByEmail").unwrap();
        assert_eq!(single.arity, Arity::Single);
        assert_eq!(collection.arity, Arity::Collection);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = IntentCache::new();
        assert!(cache.resolve("findBy").is_err());
        assert!(cache.resolve("findBy").is_err());
        assert!(cache.is_empty());
    }
}
