//! Collection scoping.
//!
//! A [`Scope`] is the fully resolved form of a collection query: equality
//! filters and sort keys over internal attribute names, plus a [`Window`]
//! with concrete pagination numbers. The REST layer builds scopes from
//! request parameters after applying defaults and caps; stores evaluate
//! them without knowing about query strings.

use std::collections::BTreeMap;

use arbor_core::query::{SortDirection, SortKey};
use arbor_core::resource::Resource;

/// The slice of a collection a request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    /// The whole collection.
    #[default]
    All,
    /// Skip `offset` records, return at most `limit`.
    ///
    /// A negative offset counts back from the end of the collection and
    /// clamps at the start.
    OffsetLimit {
        /// Records to skip, possibly from the end.
        offset: i64,
        /// Maximum records to return.
        limit: u64,
    },
}

/// A window resolved against a known collection size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    /// Index of the first record to return.
    pub start: u64,
    /// Maximum records to return.
    pub limit: u64,
}

impl Window {
    /// Resolves the window against `total` records.
    pub fn resolve(self, total: u64) -> ResolvedWindow {
        match self {
            Window::All => ResolvedWindow {
                start: 0,
                limit: total,
            },
            Window::OffsetLimit { offset, limit } => {
                let start = if offset < 0 {
                    total.saturating_sub(offset.unsigned_abs())
                } else {
                    offset as u64
                };
                ResolvedWindow { start, limit }
            }
        }
    }
}

/// A resolved collection query.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Equality filters keyed by internal attribute name.
    pub filter: BTreeMap<String, String>,
    /// Sort keys in priority order; ties fall back to id order.
    pub sort: Vec<SortKey>,
    /// The requested slice.
    pub window: Window,
}

impl Scope {
    /// Creates an unfiltered, unsorted scope over the whole collection.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds an equality filter.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    /// Adds a sort key.
    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    /// Sets the window.
    pub fn window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }
}

/// The result of evaluating a [`Scope`]: the windowed records plus the
/// size of the collection before windowing.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Records inside the window, in scope order.
    pub resources: Vec<Resource>,
    /// Matching records before the window was applied.
    pub total: u64,
}

/// Compares two attribute values for sorting.
///
/// Numbers order numerically, strings lexicographically, booleans false
/// before true; mixed or missing values order by their JSON rendering so
/// the ordering stays total.
pub fn compare_values(a: Option<&serde_json::Value>, b: Option<&serde_json::Value>) -> std::cmp::Ordering {
    use serde_json::Value;

    match (a, b) {
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None) => std::cmp::Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(std::cmp::Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

/// Applies `sort` to `resources`, falling back to id order.
pub fn sort_resources(resources: &mut [Resource], sort: &[SortKey]) {
    resources.sort_by(|a, b| {
        for key in sort {
            let ordering = compare_values(a.attribute(&key.field), b.attribute(&key.field));
            let ordering = match key.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        a.id().cmp(&b.id())
    });
}
