//! The dynamic resource record.
//!
//! A [`Resource`] is an untyped record of one resource type: an optional id,
//! a bag of attribute values, loaded related resources, and the field errors
//! accumulated against it. Handlers build resource graphs from request
//! documents, stores load and save them, and the renderer turns them back
//! into documents. There are no per-type structs; the
//! [`ResourceRegistry`](crate::schema::ResourceRegistry) supplies the shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Errors;

/// A `(type, id)` pair naming one persisted record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    /// Canonical resource type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Record id.
    pub id: String,
}

impl ResourceIdentifier {
    /// Creates an identifier.
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }
}

/// A loaded relationship slot on a [`Resource`].
#[derive(Debug, Clone)]
pub enum RelatedValue {
    /// A to-one slot; `None` means explicitly cleared.
    One(Option<Box<Resource>>),
    /// A to-many slot.
    Many(Vec<Resource>),
}

impl RelatedValue {
    /// Returns the to-one resource, if this is a non-empty to-one slot.
    pub fn as_one(&self) -> Option<&Resource> {
        match self {
            RelatedValue::One(resource) => resource.as_deref(),
            RelatedValue::Many(_) => None,
        }
    }

    /// Returns the to-many resources, if this is a to-many slot.
    pub fn as_many(&self) -> Option<&[Resource]> {
        match self {
            RelatedValue::One(_) => None,
            RelatedValue::Many(resources) => Some(resources),
        }
    }

    /// Iterates over every resource in the slot regardless of cardinality.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        let slice: &[Resource] = match self {
            RelatedValue::One(Some(resource)) => std::slice::from_ref(resource),
            RelatedValue::One(None) => &[],
            RelatedValue::Many(resources) => resources,
        };
        slice.iter()
    }

    /// Mutable variant of [`RelatedValue::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Resource> {
        let slice: &mut [Resource] = match self {
            RelatedValue::One(Some(resource)) => std::slice::from_mut(resource),
            RelatedValue::One(None) => &mut [],
            RelatedValue::Many(resources) => resources,
        };
        slice.iter_mut()
    }
}

/// One untyped record of a resource type.
#[derive(Debug, Clone, Default)]
pub struct Resource {
    type_name: String,
    id: Option<String>,
    persisted: bool,
    attributes: BTreeMap<String, Value>,
    related: BTreeMap<String, RelatedValue>,
    errors: Errors,
}

impl Resource {
    /// Creates a fresh, unpersisted record of `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Creates an unpersisted record with an id already assigned.
    pub fn with_id(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Creates a persisted record that carries only its identity.
    ///
    /// Stores use these to stand in for related records whose attributes
    /// were not loaded.
    pub fn linkage_stub(identifier: &ResourceIdentifier) -> Self {
        Self {
            type_name: identifier.type_name.clone(),
            id: Some(identifier.id.clone()),
            persisted: true,
            ..Self::default()
        }
    }

    /// The canonical resource type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The record id, if assigned.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Assigns the record id.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Returns the `(type, id)` identifier, if an id is assigned.
    pub fn identifier(&self) -> Option<ResourceIdentifier> {
        self.id
            .as_ref()
            .map(|id| ResourceIdentifier::new(self.type_name.clone(), id.clone()))
    }

    /// Whether the record exists in the store.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Marks the record as existing in the store.
    pub fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// Returns true if this record carries only its identity.
    pub fn is_linkage_only(&self) -> bool {
        self.persisted && self.attributes.is_empty() && self.related.is_empty()
    }

    /// Reads an attribute by its internal name.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Writes an attribute by its internal name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Iterates over attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if the record has no attribute values.
    pub fn attributes_is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Reads a loaded relationship slot by its internal name.
    pub fn related(&self, name: &str) -> Option<&RelatedValue> {
        self.related.get(name)
    }

    /// Mutable access to a loaded relationship slot.
    pub fn related_mut(&mut self, name: &str) -> Option<&mut RelatedValue> {
        self.related.get_mut(name)
    }

    /// Sets a to-one slot. `None` records an explicit clear.
    pub fn set_one(&mut self, name: impl Into<String>, resource: Option<Resource>) {
        self.related
            .insert(name.into(), RelatedValue::One(resource.map(Box::new)));
    }

    /// Sets a to-many slot.
    pub fn set_many(&mut self, name: impl Into<String>, resources: Vec<Resource>) {
        self.related.insert(name.into(), RelatedValue::Many(resources));
    }

    /// Iterates over loaded relationship slots in name order.
    pub fn related_slots(&self) -> impl Iterator<Item = (&str, &RelatedValue)> {
        self.related.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable variant of [`Resource::related_slots`].
    pub fn related_slots_mut(&mut self) -> impl Iterator<Item = (&str, &mut RelatedValue)> {
        self.related.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// The field errors recorded against this record.
    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Mutable access to the field errors.
    pub fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }

    /// Returns true if this record or any loaded related record carries
    /// errors.
    pub fn has_errors_deep(&self) -> bool {
        if !self.errors.is_empty() {
            return true;
        }
        self.related
            .values()
            .any(|slot| slot.iter().any(Resource::has_errors_deep))
    }
}
