//! Call-name resolution: fixed operation or derived finder.
//!
//! This is the sum-type replacement for runtime property interception:
//! `resolve` classifies a name once, and [`crate::Repository::invoke`]
//! matches on the result.

use std::sync::Arc;

use crate::cache::IntentCache;
use crate::error::{Error, Result};
use crate::intent::MethodIntent;

/// The fixed operations every repository handle exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseOperation {
    FindAll,
    FindById,
    Create,
    Update,
    Delete,
    Save,
    CreateMany,
    UpdateMany,
    DeleteMany,
    Count,
    Exists,
    Query,
}

impl BaseOperation {
    pub fn from_name(name: &str) -> Option<BaseOperation> {
        match name {
            "findAll" => Some(BaseOperation::FindAll),
            "findById" => Some(BaseOperation::FindById),
            "create" => Some(BaseOperation::Create),
            "update" => Some(BaseOperation::Update),
            "delete" => Some(BaseOperation::Delete),
            "save" => Some(BaseOperation::Save),
            "createMany" => Some(BaseOperation::CreateMany),
            "updateMany" => Some(BaseOperation::UpdateMany),
            "deleteMany" => Some(BaseOperation::DeleteMany),
            "count" => Some(BaseOperation::Count),
            "exists" => Some(BaseOperation::Exists),
            "query" => Some(BaseOperation::Query),
            _ => None,
        }
    }
}

/// Resolution of a call-site name.
#[derive(Debug, Clone)]
pub enum Dispatch {
    Base(BaseOperation),
    Finder(Arc<MethodIntent>),
}

/// Map a name onto a dispatch target.
///
/// Fixed operations win over the grammar; finder prefixes go through the
/// cache; anything else is unknown.
pub fn resolve(cache: &IntentCache, name: &str) -> Result<Dispatch> {
    if let Some(operation) = BaseOperation::from_name(name) {
        return Ok(Dispatch::Base(operation));
    }
    if name.starts_with("findAllBy") || name.starts_with("findBy") {
        return Ok(Dispatch::Finder(cache.resolve(name)?));
    }
    Err(Error::method_not_implemented(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Arity;

    #[test]
    fn base_operations_resolve_by_exact_name() {
        let cache = IntentCache::new();
        assert!(matches!(
            resolve(&cache, "findAll").unwrap(),
            Dispatch::Base(BaseOperation::FindAll)
        ));
        assert!(matches!(
            resolve(&cache, "createMany").unwrap(),
            Dispatch::Base(BaseOperation::CreateMany)
        ));
        // Nothing was parsed for these.
        assert!(cache.is_empty());
    }

    #[test]
    fn finder_names_resolve_through_the_cache() {
        let cache = IntentCache::new();
        match resolve(&cache, "findAllByStatus").unwrap() {
            Dispatch::Finder(intent) => assert_eq!(intent.arity, Arity::Collection),
            other => panic!("unexpected dispatch: {other:?}"),
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn unknown_names_are_not_implemented() {
        let cache = IntentCache::new();
        let error = resolve(&cache, "bogusMethod").unwrap_err();
        assert_eq!(error.code(), "METHOD_NOT_IMPLEMENTED");
    }

    #[test]
    fn malformed_finder_names_fail_the_grammar() {
        let cache = IntentCache::new();
        let error = resolve(&cache, "findByEmailAnd").unwrap_err();
        assert_eq!(error.code(), "INVALID_FINDER_NAME");
    }
}
