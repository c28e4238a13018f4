//! Field error model.
//!
//! Validation and document-processing failures are accumulated as
//! [`ErrorEntry`] values on the affected [`Resource`](crate::Resource)
//! rather than raised immediately, so one request can report several
//! problems at once. Errors from nested related resources are absorbed into
//! the owner's set with a dotted field prefix, producing paths like
//! `post.user.name` that mirror the request shape.

use std::collections::BTreeMap;
use std::fmt;

/// An application error code attached to a field error.
///
/// Codes double as keys into the message catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    /// Generic validation failure.
    pub const INVALID: Self = Self("invalid");
    /// A required value was absent or empty.
    pub const BLANK: Self = Self("blank");
    /// An identifier lookup matched no record.
    pub const NOT_FOUND: Self = Self("not_found");
    /// A relationship name does not exist on the resource type.
    pub const ASSOCIATION_NOT_FOUND: Self = Self("association_not_found");
    /// The operation is not allowed.
    pub const FORBIDDEN: Self = Self("forbidden");
    /// Destroy was blocked by a dependency constraint.
    pub const DELETE_RESTRICTED: Self = Self("delete_restricted");
    /// A document `type` did not match the expected resource type.
    pub const INVALID_TYPE: Self = Self("invalid_type");
    /// A unique value is already in use.
    pub const TAKEN: Self = Self("taken");

    /// Returns the code as a string.
    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One field-level error on a resource.
///
/// `field` is a dotted internal path relative to the resource the error is
/// attached to; `None` means the error concerns the whole resource (JSON:API
/// pointer `/data`). `params` carries interpolation values for message
/// resolution.
#[derive(Debug, Clone)]
pub struct ErrorEntry {
    /// The resource type the error originated on, if known.
    pub model: Option<String>,
    /// Dotted internal field path, or `None` for a whole-resource error.
    pub field: Option<String>,
    /// The error code.
    pub code: ErrorCode,
    /// Interpolation parameters for message resolution.
    pub params: BTreeMap<String, String>,
}

impl ErrorEntry {
    /// Creates a whole-resource error.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            model: None,
            field: None,
            code,
            params: BTreeMap::new(),
        }
    }

    /// Creates an error on a specific field.
    pub fn on(field: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            model: None,
            field: Some(field.into()),
            code,
            params: BTreeMap::new(),
        }
    }

    /// Sets the originating model type.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Adds an interpolation parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Returns a copy of this entry re-keyed under `prefix`.
    ///
    /// A `None` field becomes `prefix`; a `Some(f)` field becomes
    /// `prefix.f`. Used when absorbing a child resource's errors into its
    /// owner.
    pub fn prefixed(&self, prefix: &str) -> Self {
        let field = match &self.field {
            Some(f) => format!("{prefix}.{f}"),
            None => prefix.to_string(),
        };
        Self {
            model: self.model.clone(),
            field: Some(field),
            code: self.code,
            params: self.params.clone(),
        }
    }
}

/// Ordered collection of field errors attached to one resource.
#[derive(Debug, Clone, Default)]
pub struct Errors {
    entries: Vec<ErrorEntry>,
}

impl Errors {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an error.
    pub fn add(&mut self, entry: ErrorEntry) {
        self.entries.push(entry);
    }

    /// Returns true if no errors have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of recorded errors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over the recorded errors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.iter()
    }

    /// Removes all recorded errors.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Absorbs all of `child`'s errors, re-keyed under `prefix`.
    pub fn absorb(&mut self, prefix: &str, child: &Errors) {
        for entry in child.iter() {
            self.entries.push(entry.prefixed(prefix));
        }
    }
}
