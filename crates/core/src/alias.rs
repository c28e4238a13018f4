//! Field aliasing.
//!
//! A resource type may expose fields and relationships under public names
//! that differ from the internal schema names. The [`FieldAliasMap`] holds
//! the bidirectional mapping, and [`EngagedAliases`] records which aliases a
//! particular request actually used so that error output can echo the names
//! the client wrote.

use std::collections::{BTreeMap, BTreeSet};

/// Bidirectional public/internal name mapping for the fields and
/// relationships of one resource type.
///
/// Both lookup directions are idempotent: resolving a name that is already
/// on the requested side returns it unchanged. The two directions are built
/// from a single insertion direction, so cycles cannot be represented.
#[derive(Debug, Clone, Default)]
pub struct FieldAliasMap {
    to_internal: BTreeMap<String, String>,
    to_public: BTreeMap<String, String>,
}

impl FieldAliasMap {
    /// Creates an empty alias map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `public` as an alias for the internal name `internal`.
    pub fn insert(&mut self, public: impl Into<String>, internal: impl Into<String>) {
        let public = public.into();
        let internal = internal.into();
        self.to_public.insert(internal.clone(), public.clone());
        self.to_internal.insert(public, internal);
    }

    /// Resolves a public name to its internal name.
    ///
    /// Names without an alias resolve to themselves.
    pub fn unalias<'a>(&'a self, name: &'a str) -> &'a str {
        self.to_internal.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Resolves an internal name to its public name.
    ///
    /// Names without an alias resolve to themselves.
    pub fn alias_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.to_public.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Returns true if `name` is a registered public alias.
    pub fn is_alias(&self, name: &str) -> bool {
        self.to_internal.contains_key(name)
    }

    /// Returns true if no aliases are registered.
    pub fn is_empty(&self) -> bool {
        self.to_internal.is_empty()
    }
}

/// Tree of aliases a request actually used, mirroring the request shape.
///
/// Each level holds the set of public names the client wrote (only recorded
/// when the public name differs from the internal one) and one child tree
/// per relationship that was descended into, keyed by the relationship's
/// internal name.
#[derive(Debug, Clone, Default)]
pub struct EngagedAliases {
    fields: BTreeSet<String>,
    nested: BTreeMap<String, EngagedAliases>,
}

impl EngagedAliases {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the public name `public` was used at this level.
    pub fn engage(&mut self, public: impl Into<String>) {
        self.fields.insert(public.into());
    }

    /// Returns true if `public` was used at this level.
    pub fn engaged(&self, public: &str) -> bool {
        self.fields.contains(public)
    }

    /// Returns the child tree for `relationship`, creating it if absent.
    pub fn nested_mut(&mut self, relationship: &str) -> &mut EngagedAliases {
        self.nested.entry(relationship.to_string()).or_default()
    }

    /// Returns the child tree for `relationship`, if the request descended
    /// into it.
    pub fn descend(&self, relationship: &str) -> Option<&EngagedAliases> {
        self.nested.get(relationship)
    }

    /// Returns true if nothing was engaged at this level or below.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.nested.values().all(EngagedAliases::is_empty)
    }
}
