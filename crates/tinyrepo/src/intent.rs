//! Method-name grammar for derived finders.
//!
//! A finder name like `findAllByStatusOrderByCreatedAtDesc` is parsed
//! into a [`MethodIntent`]: result arity, an ordered list of predicates,
//! and an optional ordering clause. Parsing never touches the backend and
//! never validates that a field names a real column; that is the
//! backend's job at execution time.

use crate::error::{Error, Result};
use crate::ident::normalize;

/// Whether a finder yields one row (or null) or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Single,
    Collection,
}

/// Comparison applied by one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equals,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    In,
    Like,
    IsNull,
    IsNotNull,
}

impl Comparison {
    /// Whether this comparison consumes one positional call-site value.
    /// The null checks bind nothing.
    pub fn takes_value(self) -> bool {
        !matches!(self, Comparison::IsNull | Comparison::IsNotNull)
    }
}

/// One field/comparison pair extracted from a method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Canonical snake_case field name.
    pub field: String,
    pub compare: Comparison,
}

/// Sort direction of an `OrderBy` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering clause of a finder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Canonical snake_case field name.
    pub field: String,
    pub direction: Direction,
}

/// Structured query intent derived from a finder method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodIntent {
    pub arity: Arity,
    /// Never empty for a successfully parsed finder.
    pub predicates: Vec<Predicate>,
    pub ordering: Option<OrderBy>,
}

/// Comparison suffixes in longest-first order. `GreaterThan` is a proper
/// suffix of `GreaterThanEqual`, so the longer spellings must be tried
/// first.
const COMPARISON_SUFFIXES: [(&str, Comparison); 8] = [
    ("GreaterThanEqual", Comparison::GreaterOrEqual),
    ("LessThanEqual", Comparison::LessOrEqual),
    ("GreaterThan", Comparison::GreaterThan),
    ("LessThan", Comparison::LessThan),
    ("IsNotNull", Comparison::IsNotNull),
    ("IsNull", Comparison::IsNull),
    ("Like", Comparison::Like),
    ("In", Comparison::In),
];

impl MethodIntent {
    /// Parse a finder method name.
    ///
    /// `And` and `OrderBy` split at their first literal occurrence, with
    /// no escape mechanism: a field whose camelCase spelling embeds one of
    /// these tokens mid-word is mis-split. This matches the behavior the
    /// call surface has always had.
    pub fn parse(name: &str) -> Result<MethodIntent> {
        let (arity, rest) = if let Some(rest) = name.strip_prefix("findAllBy") {
            (Arity::Collection, rest)
        } else if let Some(rest) = name.strip_prefix("findBy") {
            (Arity::Single, rest)
        } else {
            return Err(Error::invalid_finder_name(
                name,
                "expected a 'findBy' or 'findAllBy' prefix",
            ));
        };

        if rest.is_empty() {
            return Err(Error::invalid_finder_name(
                name,
                "no field specified after the prefix",
            ));
        }

        let (predicate_segment, ordering) = match rest.find("OrderBy") {
            Some(pos) => {
                let segment = &rest[pos + "OrderBy".len()..];
                let ordering = parse_ordering(name, segment)?;
                (&rest[..pos], Some(ordering))
            }
            None => (rest, None),
        };

        if predicate_segment.is_empty() {
            return Err(Error::invalid_finder_name(
                name,
                "no field specified before 'OrderBy'",
            ));
        }

        let mut predicates = Vec::new();
        for part in predicate_segment.split("And") {
            if part.is_empty() {
                return Err(Error::invalid_finder_name(name, "dangling 'And' conjunction"));
            }
            let (field, compare) = split_comparison(part);
            if field.is_empty() {
                return Err(Error::invalid_finder_name(
                    name,
                    format!("comparison '{part}' is missing a field"),
                ));
            }
            predicates.push(Predicate {
                field: normalize(field),
                compare,
            });
        }

        Ok(MethodIntent {
            arity,
            predicates,
            ordering,
        })
    }
}

fn parse_ordering(name: &str, segment: &str) -> Result<OrderBy> {
    if segment.is_empty() {
        return Err(Error::invalid_finder_name(name, "empty ordering target"));
    }
    // Asc is the default when neither suffix is present.
    let (field, direction) = if let Some(field) = segment.strip_suffix("Desc") {
        (field, Direction::Desc)
    } else if let Some(field) = segment.strip_suffix("Asc") {
        (field, Direction::Asc)
    } else {
        (segment, Direction::Asc)
    };
    if field.is_empty() {
        return Err(Error::invalid_finder_name(name, "empty ordering target"));
    }
    Ok(OrderBy {
        field: normalize(field),
        direction,
    })
}

fn split_comparison(part: &str) -> (&str, Comparison) {
    for (suffix, compare) in COMPARISON_SUFFIXES {
        if let Some(field) = part.strip_suffix(suffix) {
            return (field, compare);
        }
    }
    (part, Comparison::Equals)
}
