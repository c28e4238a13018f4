//! Resource graph assembly from request documents.
//!
//! The [`ResourceGraphBuilder`] applies a JSON:API `data` fragment to a
//! [`Resource`], recursively, for arbitrarily nested relationships. Fields
//! outside the permitted whitelist are dropped silently; semantic failures
//! (unknown linkage targets, cardinality disagreements, bad `type` members)
//! are recorded as field errors on the owning resource rather than returned,
//! with dotted paths mirroring the request shape. The builder only returns
//! `Err` for infrastructure faults such as an unregistered target type.

use std::future::Future;
use std::pin::Pin;

use arbor_core::alias::EngagedAliases;
use arbor_core::error::{ErrorCode, ErrorEntry};
use arbor_core::fields::PermittedFields;
use arbor_core::resource::Resource;
use arbor_core::schema::{Cardinality, RelationshipDescriptor, ResourceDescriptor, ResourceRegistry};
use arbor_persistence::error::{RecordError, StoreError};
use arbor_persistence::store::RecordStore;
use serde_json::Value;

use crate::error::{RestError, RestResult};

/// The outcome of resolving one relationship item.
enum Item {
    Built(Resource),
    Failed(ErrorEntry),
}

/// Applies request documents to resource graphs.
///
/// One builder serves one request; it borrows the schema registry for type
/// and alias resolution and the store for linkage lookups.
pub struct ResourceGraphBuilder<'a, S> {
    registry: &'a ResourceRegistry,
    store: &'a S,
}

impl<'a, S: RecordStore> ResourceGraphBuilder<'a, S> {
    /// Creates a builder over `registry` and `store`.
    pub fn new(registry: &'a ResourceRegistry, store: &'a S) -> Self {
        Self { registry, store }
    }

    /// Applies the document fragment `fragment` to `target`.
    ///
    /// Success is signaled by the absence of new errors on `target` after
    /// the call, not by the return value. A `type` member that does not
    /// name `target`'s resource type aborts before anything is assigned.
    /// Aliases the client engaged are recorded in `engaged` so that error
    /// and document output can echo the names the client wrote.
    pub async fn assign(
        &self,
        target: &mut Resource,
        fragment: &Value,
        permitted: &PermittedFields,
        engaged: &mut EngagedAliases,
    ) -> RestResult<()> {
        self.apply(target, fragment, permitted, engaged).await
    }

    fn apply<'b>(
        &'b self,
        target: &'b mut Resource,
        fragment: &'b Value,
        permitted: &'b PermittedFields,
        engaged: &'b mut EngagedAliases,
    ) -> Pin<Box<dyn Future<Output = RestResult<()>> + Send + 'b>> {
        Box::pin(async move {
            let descriptor = self.descriptor(target.type_name())?;

            let Some(object) = fragment.as_object() else {
                target
                    .errors_mut()
                    .add(ErrorEntry::new(ErrorCode::INVALID).model(descriptor.type_name()));
                return Ok(());
            };

            if let Some(entry) = check_type(descriptor, object.get("type")) {
                target.errors_mut().add(entry);
                return Ok(());
            }

            if let Some(attributes) = object.get("attributes").and_then(Value::as_object) {
                for (name, value) in attributes {
                    let internal = descriptor.unalias(name);
                    if !permitted.scalar(internal) {
                        continue;
                    }
                    if internal != name.as_str() {
                        engaged.engage(name.clone());
                    }
                    target.set_attribute(internal.to_string(), value.clone());
                }
            }

            let Some(relationships) = object.get("relationships").and_then(Value::as_object)
            else {
                return Ok(());
            };

            let no_nested_fields = PermittedFields::new();
            for (name, payload) in relationships {
                let internal = descriptor.unalias(name).to_string();
                if !permitted.allows(&internal) {
                    continue;
                }
                if internal != *name {
                    engaged.engage(name.clone());
                }

                let Some(relationship) = descriptor.relationship(&internal) else {
                    target.errors_mut().add(
                        ErrorEntry::on(internal.clone(), ErrorCode::ASSOCIATION_NOT_FOUND)
                            .model(descriptor.type_name())
                            .param("relationship", name.clone()),
                    );
                    continue;
                };

                let Some(data) = payload.get("data") else {
                    target.errors_mut().add(
                        ErrorEntry::on(internal.clone(), ErrorCode::INVALID)
                            .model(descriptor.type_name()),
                    );
                    continue;
                };

                let nested = permitted.descend(&internal).unwrap_or(&no_nested_fields);

                match relationship.cardinality() {
                    Cardinality::One => match data {
                        Value::Null => target.set_one(internal, None),
                        Value::Array(_) => target.errors_mut().add(
                            ErrorEntry::on(internal.clone(), ErrorCode::INVALID)
                                .model(descriptor.type_name()),
                        ),
                        item => {
                            let slot = engaged.nested_mut(&internal);
                            match self.item(relationship, item, nested, slot).await? {
                                Item::Built(mut child) => {
                                    drain_errors(target, &internal, &mut child);
                                    target.set_one(internal, Some(child));
                                }
                                Item::Failed(entry) => {
                                    target.errors_mut().add(entry.prefixed(&internal));
                                }
                            }
                        }
                    },
                    Cardinality::Many => match data {
                        Value::Array(items) => {
                            let mut children = Vec::with_capacity(items.len());
                            for item in items {
                                let slot = engaged.nested_mut(&internal);
                                match self.item(relationship, item, nested, slot).await? {
                                    Item::Built(mut child) => {
                                        drain_errors(target, &internal, &mut child);
                                        children.push(child);
                                    }
                                    Item::Failed(entry) => {
                                        target.errors_mut().add(entry.prefixed(&internal));
                                    }
                                }
                            }
                            target.set_many(internal, children);
                        }
                        _ => target.errors_mut().add(
                            ErrorEntry::on(internal.clone(), ErrorCode::INVALID)
                                .model(descriptor.type_name()),
                        ),
                    },
                }
            }

            Ok(())
        })
    }

    /// Resolves one relationship item to a resource, or to the error entry
    /// that should be attached to the owner under the relationship name.
    async fn item(
        &self,
        relationship: &RelationshipDescriptor,
        item: &Value,
        permitted: &PermittedFields,
        engaged: &mut EngagedAliases,
    ) -> RestResult<Item> {
        let descriptor = self.descriptor(relationship.target())?;

        let Some(object) = item.as_object() else {
            return Ok(Item::Failed(
                ErrorEntry::new(ErrorCode::INVALID).model(descriptor.type_name()),
            ));
        };

        if let Some(entry) = check_type(descriptor, object.get("type")) {
            return Ok(Item::Failed(entry));
        }

        let id = object.get("id").and_then(Value::as_str);
        let has_payload =
            object.contains_key("attributes") || object.contains_key("relationships");

        let mut child = match id {
            Some(id) => match self.store.find(descriptor.type_name(), id).await {
                Ok(found) => found,
                Err(StoreError::Record(RecordError::NotFound { .. })) => {
                    return Ok(Item::Failed(
                        ErrorEntry::new(ErrorCode::NOT_FOUND)
                            .model(descriptor.type_name())
                            .param("model", descriptor.public_type())
                            .param("id", id),
                    ));
                }
                Err(other) => return Err(other.into()),
            },
            // Attributes without an id build a fresh record.
            None if has_payload => Resource::new(descriptor.type_name()),
            None => {
                return Ok(Item::Failed(
                    ErrorEntry::on("type", ErrorCode::INVALID).model(descriptor.type_name()),
                ));
            }
        };

        if has_payload {
            self.apply(&mut child, item, permitted, engaged).await?;
        }

        Ok(Item::Built(child))
    }

    fn descriptor(&self, type_name: &str) -> RestResult<&ResourceDescriptor> {
        self.registry
            .descriptor(type_name)
            .ok_or_else(|| RestError::Internal {
                message: format!("resource type {} is not registered", type_name),
            })
    }
}

/// Validates a fragment's `type` member against the expected descriptor.
///
/// Both the public and the canonical type name are accepted.
fn check_type(descriptor: &ResourceDescriptor, value: Option<&Value>) -> Option<ErrorEntry> {
    match value.and_then(Value::as_str) {
        Some(name) if name == descriptor.public_type() || name == descriptor.type_name() => None,
        Some(name) => Some(
            ErrorEntry::on("type", ErrorCode::INVALID_TYPE)
                .model(descriptor.type_name())
                .param("given", name),
        ),
        None => Some(ErrorEntry::on("type", ErrorCode::BLANK).model(descriptor.type_name())),
    }
}

/// Moves a child's errors onto the owner, prefixed with the relationship
/// name. The child stays attached so processing continues past failures.
fn drain_errors(owner: &mut Resource, relationship: &str, child: &mut Resource) {
    if child.errors().is_empty() {
        return;
    }
    let child_errors = std::mem::take(child.errors_mut());
    owner.errors_mut().absorb(relationship, &child_errors);
}
