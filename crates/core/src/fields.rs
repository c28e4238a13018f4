//! Recursive permitted-field whitelists.
//!
//! Write requests may only set fields an application explicitly permits.
//! A [`PermittedFields`] tree whitelists scalar fields at one level and
//! nests further trees under relationship names, mirroring the shape of an
//! incoming document. Fields absent from the tree are dropped silently
//! rather than rejected. The [`PermitTable`] holds one tree per resource
//! type and operation.

use std::collections::{BTreeMap, BTreeSet};

/// A whitelist of writable fields for one level of a document.
///
/// All names are internal names; callers resolve aliases before consulting
/// the tree.
#[derive(Debug, Clone, Default)]
pub struct PermittedFields {
    scalars: BTreeSet<String>,
    nested: BTreeMap<String, PermittedFields>,
}

impl PermittedFields {
    /// Creates an empty whitelist that permits nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Permits a scalar field or a relationship given as plain linkage.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.scalars.insert(name.into());
        self
    }

    /// Permits several scalar fields at once.
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scalars.extend(names.into_iter().map(Into::into));
        self
    }

    /// Permits a relationship along with a whitelist for the records nested
    /// under it.
    pub fn nested(mut self, name: impl Into<String>, permitted: PermittedFields) -> Self {
        self.nested.insert(name.into(), permitted);
        self
    }

    /// Returns true if `name` is permitted at this level, either as a
    /// scalar or as a nested relationship.
    pub fn allows(&self, name: &str) -> bool {
        self.scalars.contains(name) || self.nested.contains_key(name)
    }

    /// Returns true if `name` is permitted as a scalar at this level.
    pub fn scalar(&self, name: &str) -> bool {
        self.scalars.contains(name)
    }

    /// Returns the whitelist for records nested under `name`.
    ///
    /// A relationship permitted only as a scalar yields an empty whitelist:
    /// its linkage may be set but nested records may carry no fields.
    pub fn descend(&self, name: &str) -> Option<&PermittedFields> {
        self.nested.get(name)
    }

    /// Returns true if nothing is permitted at this level or below.
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.nested.is_empty()
    }
}

/// Per-type, per-operation permitted-field trees.
#[derive(Debug, Clone, Default)]
pub struct PermitTable {
    create: BTreeMap<String, PermittedFields>,
    update: BTreeMap<String, PermittedFields>,
}

impl PermitTable {
    /// Creates a table that permits nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the whitelist applied when creating records of `type_name`.
    pub fn permit_create(
        mut self,
        type_name: impl Into<String>,
        permitted: PermittedFields,
    ) -> Self {
        self.create.insert(type_name.into(), permitted);
        self
    }

    /// Sets the whitelist applied when updating records of `type_name`.
    pub fn permit_update(
        mut self,
        type_name: impl Into<String>,
        permitted: PermittedFields,
    ) -> Self {
        self.update.insert(type_name.into(), permitted);
        self
    }

    /// The create whitelist for `type_name`, if one was declared.
    ///
    /// An undeclared type permits nothing.
    pub fn for_create(&self, type_name: &str) -> Option<&PermittedFields> {
        self.create.get(type_name)
    }

    /// The update whitelist for `type_name`, if one was declared.
    pub fn for_update(&self, type_name: &str) -> Option<&PermittedFields> {
        self.update.get(type_name)
    }
}
