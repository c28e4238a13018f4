//! Resource descriptors and the registry.
//!
//! Every resource type the engine serves is described up front by a
//! [`ResourceDescriptor`]: its attributes, relationships, aliases,
//! validations and public type name. Descriptors are assembled into a
//! [`ResourceRegistry`] at startup, which checks cross-type references once
//! so that request handling can assume a well formed schema.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::alias::FieldAliasMap;
use crate::error::ErrorEntry;
use crate::resource::Resource;

/// Whether a relationship points at one record or a list of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// A to-one relationship.
    One,
    /// A to-many relationship.
    Many,
}

/// What happens to dependent records when their owner is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteRule {
    /// Dependents are left alone; the link is simply dropped.
    #[default]
    Ignore,
    /// Destroy is refused while dependents exist.
    Restrict,
    /// Dependents keep existing but their back-reference is cleared.
    Nullify,
}

/// A validation attached to a resource type.
///
/// Validations run when a resource graph is saved. Each failure produces an
/// [`ErrorEntry`] on the offending resource.
#[derive(Debug, Clone)]
pub enum Validation {
    /// The named attribute must be present and non-empty.
    Presence {
        /// Internal attribute name.
        field: String,
    },
    /// The named attribute must be unique across persisted records of the
    /// type.
    Unique {
        /// Internal attribute name.
        field: String,
    },
    /// An arbitrary check over the whole resource.
    Custom {
        /// Label used in logs.
        name: &'static str,
        /// Returns any errors the resource should carry.
        check: fn(&Resource) -> Vec<ErrorEntry>,
    },
}

/// Describes one relationship of a resource type.
#[derive(Debug, Clone)]
pub struct RelationshipDescriptor {
    name: String,
    cardinality: Cardinality,
    target: String,
    inverse: Option<String>,
    delete_rule: DeleteRule,
}

impl RelationshipDescriptor {
    /// Declares a to-one relationship named `name` targeting the resource
    /// type `target`.
    pub fn to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::One,
            target: target.into(),
            inverse: None,
            delete_rule: DeleteRule::Ignore,
        }
    }

    /// Declares a to-many relationship named `name` targeting the resource
    /// type `target`.
    pub fn to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::Many,
            target: target.into(),
            inverse: None,
            delete_rule: DeleteRule::Ignore,
        }
    }

    /// Names the relationship on the target type that points back at this
    /// one. The registry verifies the inverse exists.
    pub fn inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse = Some(inverse.into());
        self
    }

    /// Sets the rule applied to linked records when the owner is destroyed.
    pub fn on_delete(mut self, rule: DeleteRule) -> Self {
        self.delete_rule = rule;
        self
    }

    /// The relationship's internal name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the relationship is to-one or to-many.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// The canonical type name of the related resource.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The declared inverse relationship name on the target type, if any.
    pub fn inverse_name(&self) -> Option<&str> {
        self.inverse.as_deref()
    }

    /// The delete rule for this relationship.
    pub fn delete_rule(&self) -> DeleteRule {
        self.delete_rule
    }
}

/// The static description of one resource type.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    type_name: String,
    public_type: Option<String>,
    attributes: BTreeSet<String>,
    aliases: FieldAliasMap,
    relationships: BTreeMap<String, RelationshipDescriptor>,
    validations: Vec<Validation>,
    routed: bool,
}

impl ResourceDescriptor {
    /// Starts building a descriptor for the canonical type `type_name`.
    pub fn build(type_name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            descriptor: ResourceDescriptor {
                type_name: type_name.into(),
                public_type: None,
                attributes: BTreeSet::new(),
                aliases: FieldAliasMap::new(),
                relationships: BTreeMap::new(),
                validations: Vec::new(),
                routed: true,
            },
        }
    }

    /// The canonical (internal) type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The name the type is exposed under, falling back to the canonical
    /// name when no public alias was declared.
    pub fn public_type(&self) -> &str {
        self.public_type.as_deref().unwrap_or(&self.type_name)
    }

    /// Returns true if `name` is a declared attribute (internal name).
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Iterates over declared attribute names.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }

    /// Looks up a relationship by its internal name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.get(name)
    }

    /// Iterates over declared relationships.
    pub fn relationships(&self) -> impl Iterator<Item = &RelationshipDescriptor> {
        self.relationships.values()
    }

    /// Returns true if `name` is a declared relationship (internal name).
    pub fn is_relationship(&self, name: &str) -> bool {
        self.relationships.contains_key(name)
    }

    /// Resolves a public field name to its internal name.
    pub fn unalias<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.unalias(name)
    }

    /// Resolves an internal field name to its public name.
    pub fn alias_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.alias_for(name)
    }

    /// The field alias map for this type.
    pub fn aliases(&self) -> &FieldAliasMap {
        &self.aliases
    }

    /// The validations declared for this type.
    pub fn validations(&self) -> &[Validation] {
        &self.validations
    }

    /// Whether the type is served under its own routes. Unrouted types are
    /// still renderable but get no `self`/`related` links.
    pub fn is_routed(&self) -> bool {
        self.routed
    }
}

/// Builder returned by [`ResourceDescriptor::build`].
#[derive(Debug)]
pub struct DescriptorBuilder {
    descriptor: ResourceDescriptor,
}

impl DescriptorBuilder {
    /// Exposes the type under `public` instead of its canonical name.
    pub fn public_type(mut self, public: impl Into<String>) -> Self {
        self.descriptor.public_type = Some(public.into());
        self
    }

    /// Declares an attribute by its internal name.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.descriptor.attributes.insert(name.into());
        self
    }

    /// Registers `public` as the exposed name for the internal field
    /// `internal`.
    pub fn alias(mut self, public: impl Into<String>, internal: impl Into<String>) -> Self {
        self.descriptor.aliases.insert(public, internal);
        self
    }

    /// Declares a relationship.
    pub fn relationship(mut self, relationship: RelationshipDescriptor) -> Self {
        self.descriptor
            .relationships
            .insert(relationship.name.clone(), relationship);
        self
    }

    /// Attaches a validation.
    pub fn validate(mut self, validation: Validation) -> Self {
        self.descriptor.validations.push(validation);
        self
    }

    /// Marks the type as routed or unrouted.
    pub fn routed(mut self, routed: bool) -> Self {
        self.descriptor.routed = routed;
        self
    }

    /// Finishes the descriptor.
    pub fn finish(self) -> ResourceDescriptor {
        self.descriptor
    }
}

/// Errors detected while assembling a [`ResourceRegistry`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A type name was registered twice.
    #[error("resource type `{0}` is registered more than once")]
    DuplicateType(String),
    /// Two types claim the same public name.
    #[error("public type `{public}` is used by both `{existing}` and `{duplicate}`")]
    DuplicatePublicType {
        /// The contested public name.
        public: String,
        /// Canonical name of the type that claimed it first.
        existing: String,
        /// Canonical name of the type that claimed it second.
        duplicate: String,
    },
    /// A relationship targets a type that is not registered.
    #[error("relationship `{type_name}.{relationship}` targets unknown type `{target}`")]
    UnknownTarget {
        /// Canonical name of the declaring type.
        type_name: String,
        /// The relationship's internal name.
        relationship: String,
        /// The missing target type.
        target: String,
    },
    /// A declared inverse does not exist on the target type.
    #[error(
        "inverse `{inverse}` of `{type_name}.{relationship}` is not a relationship on `{target}`"
    )]
    UnknownInverse {
        /// Canonical name of the declaring type.
        type_name: String,
        /// The relationship's internal name.
        relationship: String,
        /// Canonical name of the target type.
        target: String,
        /// The missing inverse relationship name.
        inverse: String,
    },
}

/// The startup-built index of all resource descriptors.
///
/// Lookup accepts either canonical or public type names. The registry is
/// immutable once built; handlers hold it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    descriptors: BTreeMap<String, ResourceDescriptor>,
    public_index: BTreeMap<String, String>,
}

impl ResourceRegistry {
    /// Starts building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            descriptors: Vec::new(),
        }
    }

    /// Looks up a descriptor by canonical or public type name.
    pub fn descriptor(&self, name: &str) -> Option<&ResourceDescriptor> {
        if let Some(descriptor) = self.descriptors.get(name) {
            return Some(descriptor);
        }
        let canonical = self.public_index.get(name)?;
        self.descriptors.get(canonical)
    }

    /// Resolves a canonical or public type name to the canonical name.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.descriptor(name).map(ResourceDescriptor::type_name)
    }

    /// Iterates over all descriptors in canonical-name order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.descriptors.values()
    }
}

/// Builder returned by [`ResourceRegistry::builder`].
#[derive(Debug)]
pub struct RegistryBuilder {
    descriptors: Vec<ResourceDescriptor>,
}

impl RegistryBuilder {
    /// Adds a resource descriptor.
    pub fn resource(mut self, descriptor: ResourceDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Validates cross-type references and builds the registry.
    pub fn finish(self) -> Result<ResourceRegistry, SchemaError> {
        let mut registry = ResourceRegistry::default();
        for descriptor in self.descriptors {
            let canonical = descriptor.type_name.clone();
            if registry.descriptors.contains_key(&canonical) {
                return Err(SchemaError::DuplicateType(canonical));
            }
            if let Some(public) = &descriptor.public_type {
                if let Some(existing) = registry.public_index.get(public) {
                    return Err(SchemaError::DuplicatePublicType {
                        public: public.clone(),
                        existing: existing.clone(),
                        duplicate: canonical,
                    });
                }
                registry.public_index.insert(public.clone(), canonical.clone());
            }
            registry.descriptors.insert(canonical, descriptor);
        }

        for descriptor in registry.descriptors.values() {
            for relationship in descriptor.relationships() {
                let target = match registry.descriptors.get(relationship.target()) {
                    Some(target) => target,
                    None => {
                        return Err(SchemaError::UnknownTarget {
                            type_name: descriptor.type_name.clone(),
                            relationship: relationship.name().to_string(),
                            target: relationship.target().to_string(),
                        });
                    }
                };
                if let Some(inverse) = relationship.inverse_name() {
                    if !target.is_relationship(inverse) {
                        return Err(SchemaError::UnknownInverse {
                            type_name: descriptor.type_name.clone(),
                            relationship: relationship.name().to_string(),
                            target: target.type_name.clone(),
                            inverse: inverse.to_string(),
                        });
                    }
                }
            }
        }

        Ok(registry)
    }
}
