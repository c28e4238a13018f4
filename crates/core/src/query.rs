//! The per-request query specification.
//!
//! A [`QuerySpec`] is the parsed, immutable form of a request's query
//! parameters: sort keys, pagination, equality filters, sparse fieldsets
//! and include paths. Handlers build one per request; planners and
//! renderers read it without further parsing.

use std::collections::{BTreeMap, BTreeSet};

/// Sort order for one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Ascending,
    /// Descending order, requested with a `-` prefix.
    Descending,
}

/// One resolved sort key: an internal attribute name and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Internal attribute name.
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortKey {
    /// Creates an ascending sort key.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Creates a descending sort key.
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// The pagination a request asked for, before defaults and caps apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSpec {
    /// No pagination parameters were given.
    #[default]
    Unspecified,
    /// `page[number]` / `page[size]`, 1-based.
    Numbered {
        /// 1-based page number.
        number: u64,
        /// Records per page; `None` takes the configured default.
        size: Option<u64>,
    },
    /// `page[offset]` / `page[limit]`.
    ///
    /// A negative offset counts back from the end of the collection.
    OffsetLimit {
        /// Records to skip, or a from-the-end position when negative.
        offset: Option<i64>,
        /// Maximum records to return; `None` takes the configured default.
        limit: Option<u64>,
    },
}

/// The parsed query parameters of one request.
///
/// Sort and filter keys are internal attribute names; fieldset keys are
/// public type names with public field names; include paths are chains of
/// internal relationship names.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    /// Sort keys in priority order.
    pub sort: Vec<SortKey>,
    /// Requested pagination.
    pub page: PageSpec,
    /// Equality filters keyed by internal attribute name.
    pub filter: BTreeMap<String, String>,
    /// Sparse fieldsets keyed by public type name.
    pub fields: BTreeMap<String, BTreeSet<String>>,
    /// Include paths, each a chain of internal relationship names.
    pub include: Vec<Vec<String>>,
}

impl QuerySpec {
    /// Creates an empty specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the requested fieldset for `public_type`, if one was given.
    pub fn fieldset(&self, public_type: &str) -> Option<&BTreeSet<String>> {
        self.fields.get(public_type)
    }

    /// Returns true if any include path starts by descending into
    /// `relationship` at the given depth prefix.
    pub fn includes_path(&self, path: &[&str]) -> bool {
        self.include.iter().any(|candidate| {
            candidate.len() >= path.len()
                && candidate.iter().zip(path).all(|(a, b)| a == b)
        })
    }
}
