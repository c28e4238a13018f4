//! Message resolution for field errors.
//!
//! Error details are looked up in a [`MessageCatalog`] keyed from most to
//! least specific: `models.{model}.{field}.{code}`, then `{field}.{code}`,
//! then the bare `{code}`, falling back to the code itself. Templates may
//! interpolate error parameters with `%{name}` placeholders.

use std::collections::BTreeMap;

use crate::error::ErrorEntry;

/// Resolves an error entry to a human readable detail string.
///
/// The engine ships [`MessageCatalog`]; applications can substitute their
/// own resolver to plug in a translation backend.
pub trait MessageResolver: Send + Sync {
    /// Produces the detail string for one error entry.
    fn resolve(&self, entry: &ErrorEntry) -> String;
}

/// An in-memory template catalog with most-specific-wins lookup.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    templates: BTreeMap<String, String>,
}

impl MessageCatalog {
    /// Creates an empty catalog. Unresolvable entries fall back to their
    /// raw code.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog preloaded with a default template per error code.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.insert("invalid", "is invalid");
        catalog.insert("blank", "can't be blank");
        catalog.insert("taken", "has already been taken");
        catalog.insert("not_found", "could not be found");
        catalog.insert("association_not_found", "could not be found");
        catalog.insert("forbidden", "is forbidden");
        catalog.insert("delete_restricted", "cannot be deleted: %{reason}");
        catalog.insert("invalid_type", "is not a valid type");
        catalog
    }

    /// Registers a template under `key`.
    ///
    /// Keys follow the lookup scheme: a bare code, `{field}.{code}`, or
    /// `models.{model}.{field}.{code}`.
    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(key.into(), template.into());
    }

    fn lookup(&self, entry: &ErrorEntry) -> Option<&str> {
        let code = entry.code.as_str();
        if let (Some(model), Some(field)) = (&entry.model, &entry.field) {
            let key = format!("models.{model}.{field}.{code}");
            if let Some(template) = self.templates.get(&key) {
                return Some(template);
            }
        }
        if let Some(field) = &entry.field {
            let key = format!("{field}.{code}");
            if let Some(template) = self.templates.get(&key) {
                return Some(template);
            }
        }
        self.templates.get(code).map(String::as_str)
    }
}

impl MessageResolver for MessageCatalog {
    fn resolve(&self, entry: &ErrorEntry) -> String {
        let template = match self.lookup(entry) {
            Some(template) => template,
            None => return entry.code.as_str().to_string(),
        };
        interpolate(template, &entry.params)
    }
}

/// Replaces `%{name}` placeholders with parameter values.
///
/// Placeholders without a matching parameter are left verbatim.
fn interpolate(template: &str, params: &BTreeMap<String, String>) -> String {
    let mut detail = template.to_string();
    for (name, value) in params {
        detail = detail.replace(&format!("%{{{name}}}"), value);
    }
    detail
}
