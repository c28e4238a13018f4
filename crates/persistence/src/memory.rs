//! The in-memory store backend.
//!
//! Records live in per-type tables keyed by id; relationships are kept as
//! identifier-level linkage on both sides. A save validates the whole
//! resource graph under one write lock and either commits every record or
//! writes nothing. Declared inverse relationships are maintained
//! authoritatively from the owning side on every write.

use std::collections::BTreeMap;
use std::sync::Arc;

use arbor_core::error::{ErrorCode, ErrorEntry, Errors};
use arbor_core::resource::{RelatedValue, Resource, ResourceIdentifier};
use arbor_core::schema::{
    Cardinality, DeleteRule, RelationshipDescriptor, ResourceDescriptor, ResourceRegistry,
    Validation,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::scope::{Scope, Selection, sort_resources};
use crate::store::{LinkageOp, RecordStore};

/// Identifier-level linkage for one relationship slot of a row.
#[derive(Debug, Clone)]
enum Linkage {
    One(Option<ResourceIdentifier>),
    Many(Vec<ResourceIdentifier>),
}

#[derive(Debug, Clone, Default)]
struct Row {
    attributes: BTreeMap<String, Value>,
    links: BTreeMap<String, Linkage>,
    // Ids are random, so unsorted selects order by insertion instead.
    sequence: u64,
}

#[derive(Debug, Default)]
struct Tables {
    rows: BTreeMap<String, BTreeMap<String, Row>>,
    next_sequence: u64,
}

impl Tables {
    fn row(&self, identifier: &ResourceIdentifier) -> Option<&Row> {
        self.rows.get(&identifier.type_name)?.get(&identifier.id)
    }

    fn row_mut(&mut self, identifier: &ResourceIdentifier) -> Option<&mut Row> {
        self.rows.get_mut(&identifier.type_name)?.get_mut(&identifier.id)
    }
}

/// An in-memory [`RecordStore`] backed by per-type tables.
pub struct MemoryStore {
    registry: Arc<ResourceRegistry>,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store over the given schema.
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        let mut tables = Tables::default();
        for descriptor in registry.descriptors() {
            tables.rows.insert(descriptor.type_name().to_string(), BTreeMap::new());
        }
        Self {
            registry,
            tables: RwLock::new(tables),
        }
    }

    /// The schema this store serves.
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    fn materialize(&self, descriptor: &ResourceDescriptor, id: &str, row: &Row) -> Resource {
        let mut resource = Resource::with_id(descriptor.type_name(), id);
        for (name, value) in &row.attributes {
            resource.set_attribute(name.clone(), value.clone());
        }
        for relationship in descriptor.relationships() {
            match relationship.cardinality() {
                Cardinality::One => {
                    let linked = match row.links.get(relationship.name()) {
                        Some(Linkage::One(linked)) => linked.clone(),
                        _ => None,
                    };
                    resource.set_one(
                        relationship.name(),
                        linked.as_ref().map(Resource::linkage_stub),
                    );
                }
                Cardinality::Many => {
                    let linked = match row.links.get(relationship.name()) {
                        Some(Linkage::Many(linked)) => linked.clone(),
                        _ => Vec::new(),
                    };
                    resource.set_many(
                        relationship.name(),
                        linked.iter().map(Resource::linkage_stub).collect(),
                    );
                }
            }
        }
        resource.mark_persisted();
        resource
    }

    fn validate_graph(
        &self,
        tables: &Tables,
        resource: &Resource,
        via_inverse: Option<&str>,
    ) -> Errors {
        let mut errors = Errors::new();
        if resource.is_linkage_only() {
            return errors;
        }
        let Some(descriptor) = self.registry.descriptor(resource.type_name()) else {
            errors.add(ErrorEntry::new(ErrorCode::INVALID).model(resource.type_name()));
            return errors;
        };

        for validation in descriptor.validations() {
            match validation {
                Validation::Presence { field } => {
                    if !presence_satisfied(resource, field, via_inverse) {
                        errors.add(
                            ErrorEntry::on(field.clone(), ErrorCode::BLANK)
                                .model(descriptor.type_name()),
                        );
                    }
                }
                Validation::Unique { field } => {
                    if let Some(value) = resource.attribute(field) {
                        if !value.is_null()
                            && value_taken(tables, descriptor.type_name(), resource.id(), field, value)
                        {
                            errors.add(
                                ErrorEntry::on(field.clone(), ErrorCode::TAKEN)
                                    .model(descriptor.type_name())
                                    .param("value", render_scalar(value)),
                            );
                        }
                    }
                }
                Validation::Custom { check, .. } => {
                    for entry in check(resource) {
                        errors.add(entry);
                    }
                }
            }
        }

        for (rel_name, slot) in resource.related_slots() {
            let via = descriptor
                .relationship(rel_name)
                .and_then(RelationshipDescriptor::inverse_name);
            for child in slot.iter() {
                let child_errors = self.validate_graph(tables, child, via);
                errors.absorb(rel_name, &child_errors);
            }
        }
        errors
    }

    fn write_graph(
        &self,
        tables: &mut Tables,
        resource: &mut Resource,
        now: &str,
    ) -> StoreResult<ResourceIdentifier> {
        if resource.is_linkage_only() {
            return resource.identifier().ok_or_else(|| {
                StoreError::Internal("linkage stub without an id".to_string())
            });
        }

        let type_name = resource.type_name().to_string();
        let descriptor = self
            .registry
            .descriptor(&type_name)
            .ok_or_else(|| StoreError::unknown_type(&type_name))?;

        let is_new = match resource.id() {
            Some(id) => !tables
                .rows
                .get(&type_name)
                .is_some_and(|rows| rows.contains_key(id)),
            None => true,
        };
        let id = match resource.id() {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                resource.set_id(id.clone());
                id
            }
        };
        let owner = ResourceIdentifier::new(type_name.clone(), id.clone());

        if is_new {
            resource.set_attribute("created_at", Value::String(now.to_string()));
        }
        resource.set_attribute("updated_at", Value::String(now.to_string()));

        // Children first, so linkage always names persisted records.
        let mut links: Vec<(String, Linkage, Vec<ResourceIdentifier>, Vec<ResourceIdentifier>)> =
            Vec::new();
        let rel_names: Vec<String> = resource
            .related_slots()
            .map(|(name, _)| name.to_string())
            .collect();
        for rel_name in &rel_names {
            let Some(relationship) = descriptor.relationship(rel_name) else {
                continue;
            };
            let mut members = Vec::new();
            if let Some(slot) = resource.related_mut(rel_name) {
                for child in slot.iter_mut() {
                    members.push(self.write_graph(tables, child, now)?);
                }
            }
            let linkage = match relationship.cardinality() {
                Cardinality::One => Linkage::One(members.first().cloned()),
                Cardinality::Many => Linkage::Many(members.clone()),
            };
            let old = linkage_identifiers(
                tables.row(&owner).and_then(|row| row.links.get(rel_name)),
            );
            links.push((rel_name.clone(), linkage, old, members));
        }

        let attributes: Vec<(String, Value)> = resource
            .attributes()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        let row = tables
            .rows
            .entry(type_name.clone())
            .or_default()
            .entry(id.clone())
            .or_default();
        if row.sequence == 0 {
            tables.next_sequence += 1;
            row.sequence = tables.next_sequence;
        }
        for (name, value) in attributes {
            row.attributes.insert(name, value);
        }
        for (rel_name, linkage, _, _) in &links {
            row.links.insert(rel_name.clone(), linkage.clone());
        }
        resource.mark_persisted();

        for (rel_name, _, old, new) in &links {
            let Some(relationship) = descriptor.relationship(rel_name) else {
                continue;
            };
            for removed in old.iter().filter(|member| !new.contains(member)) {
                remove_inverse(tables, &owner, relationship, removed);
            }
            for added in new.iter().filter(|member| !old.contains(member)) {
                set_inverse(tables, &self.registry, &owner, relationship, added);
            }
        }

        Ok(owner)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, type_name: &str, scope: &Scope) -> StoreResult<Selection> {
        let tables = self.tables.read();
        let descriptor = self
            .registry
            .descriptor(type_name)
            .ok_or_else(|| StoreError::unknown_type(type_name))?;

        let mut matched: Vec<(u64, Resource)> = tables
            .rows
            .get(descriptor.type_name())
            .map(|rows| {
                rows.iter()
                    .filter(|(_, row)| {
                        scope
                            .filter
                            .iter()
                            .all(|(field, want)| value_matches(row.attributes.get(field), want))
                    })
                    .map(|(id, row)| (row.sequence, self.materialize(descriptor, id, row)))
                    .collect()
            })
            .unwrap_or_default();
        matched.sort_by_key(|(sequence, _)| *sequence);

        let mut resources: Vec<Resource> = matched
            .into_iter()
            .map(|(_, resource)| resource)
            .collect();
        if !scope.sort.is_empty() {
            sort_resources(&mut resources, &scope.sort);
        }

        let total = resources.len() as u64;
        let window = scope.window.resolve(total);
        let resources = resources
            .into_iter()
            .skip(window.start as usize)
            .take(window.limit as usize)
            .collect();
        Ok(Selection { resources, total })
    }

    async fn find(&self, type_name: &str, id: &str) -> StoreResult<Resource> {
        let tables = self.tables.read();
        let descriptor = self
            .registry
            .descriptor(type_name)
            .ok_or_else(|| StoreError::unknown_type(type_name))?;
        let row = tables
            .rows
            .get(descriptor.type_name())
            .and_then(|rows| rows.get(id))
            .ok_or_else(|| StoreError::not_found(descriptor.type_name(), id))?;
        Ok(self.materialize(descriptor, id, row))
    }

    async fn exists(&self, identifier: &ResourceIdentifier) -> StoreResult<bool> {
        let tables = self.tables.read();
        Ok(tables.row(identifier).is_some())
    }

    async fn save(&self, resource: &mut Resource) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if self.registry.descriptor(resource.type_name()).is_none() {
            return Err(StoreError::unknown_type(resource.type_name()));
        }

        let errors = self.validate_graph(&tables, resource, None);
        if !errors.is_empty() {
            debug!(
                type_name = %resource.type_name(),
                error_count = errors.len(),
                "rejected invalid resource graph"
            );
            return Err(StoreError::Invalid(errors));
        }

        let now = Utc::now().to_rfc3339();
        let owner = self.write_graph(&mut tables, resource, &now)?;
        debug!(type_name = %owner.type_name, id = %owner.id, "saved resource graph");
        Ok(())
    }

    async fn destroy(&self, type_name: &str, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let descriptor = self
            .registry
            .descriptor(type_name)
            .ok_or_else(|| StoreError::unknown_type(type_name))?;
        let canonical = descriptor.type_name().to_string();
        let row = tables
            .rows
            .get(&canonical)
            .and_then(|rows| rows.get(id))
            .ok_or_else(|| StoreError::not_found(&canonical, id))?;

        for relationship in descriptor.relationships() {
            if relationship.delete_rule() != DeleteRule::Restrict {
                continue;
            }
            let occupied = match row.links.get(relationship.name()) {
                Some(Linkage::One(Some(_))) => true,
                Some(Linkage::Many(linked)) => !linked.is_empty(),
                _ => false,
            };
            if occupied {
                return Err(StoreError::Restricted {
                    type_name: canonical,
                    id: id.to_string(),
                    reason: format!("dependent {} exist", relationship.name()),
                });
            }
        }

        if let Some(rows) = tables.rows.get_mut(&canonical) {
            rows.remove(id);
        }
        let removed = ResourceIdentifier::new(canonical, id);
        for rows in tables.rows.values_mut() {
            for row in rows.values_mut() {
                for linkage in row.links.values_mut() {
                    match linkage {
                        Linkage::One(slot) => {
                            if slot.as_ref() == Some(&removed) {
                                *slot = None;
                            }
                        }
                        Linkage::Many(linked) => linked.retain(|member| member != &removed),
                    }
                }
            }
        }
        debug!(type_name = %removed.type_name, id = %removed.id, "destroyed record");
        Ok(())
    }

    async fn load_related(
        &self,
        identifier: &ResourceIdentifier,
        relationship: &str,
    ) -> StoreResult<RelatedValue> {
        let tables = self.tables.read();
        let descriptor = self
            .registry
            .descriptor(&identifier.type_name)
            .ok_or_else(|| StoreError::unknown_type(&identifier.type_name))?;
        let relationship = descriptor
            .relationship(relationship)
            .ok_or_else(|| StoreError::unknown_relationship(descriptor.type_name(), relationship))?;
        let row = tables
            .row(identifier)
            .ok_or_else(|| StoreError::not_found(&identifier.type_name, &identifier.id))?;

        let load = |member: &ResourceIdentifier| -> Option<Resource> {
            let target = self.registry.descriptor(&member.type_name)?;
            let row = tables.row(member)?;
            Some(self.materialize(target, &member.id, row))
        };

        match relationship.cardinality() {
            Cardinality::One => {
                let linked = match row.links.get(relationship.name()) {
                    Some(Linkage::One(Some(member))) => load(member),
                    _ => None,
                };
                Ok(RelatedValue::One(linked.map(Box::new)))
            }
            Cardinality::Many => {
                let linked = match row.links.get(relationship.name()) {
                    Some(Linkage::Many(members)) => {
                        members.iter().filter_map(load).collect()
                    }
                    _ => Vec::new(),
                };
                Ok(RelatedValue::Many(linked))
            }
        }
    }

    async fn mutate_linkage(
        &self,
        identifier: &ResourceIdentifier,
        relationship: &str,
        op: LinkageOp,
    ) -> StoreResult<RelatedValue> {
        let mut tables = self.tables.write();
        let descriptor = self
            .registry
            .descriptor(&identifier.type_name)
            .ok_or_else(|| StoreError::unknown_type(&identifier.type_name))?;
        let relationship = descriptor
            .relationship(relationship)
            .ok_or_else(|| StoreError::unknown_relationship(descriptor.type_name(), relationship))?;
        if tables.row(identifier).is_none() {
            return Err(StoreError::not_found(&identifier.type_name, &identifier.id));
        }

        let referenced: Vec<&ResourceIdentifier> = match &op {
            LinkageOp::ReplaceOne(Some(member)) => vec![member],
            LinkageOp::ReplaceOne(None) => Vec::new(),
            LinkageOp::ReplaceMany(members)
            | LinkageOp::Add(members)
            | LinkageOp::Remove(members) => members.iter().collect(),
        };
        for member in &referenced {
            if tables.row(member).is_none() {
                return Err(StoreError::MissingLinkage {
                    type_name: member.type_name.clone(),
                    id: member.id.clone(),
                });
            }
        }

        let old = linkage_identifiers(
            tables
                .row(identifier)
                .and_then(|row| row.links.get(relationship.name())),
        );
        let new_linkage = match (&op, relationship.cardinality()) {
            (LinkageOp::ReplaceOne(member), Cardinality::One) => Linkage::One(member.clone()),
            (LinkageOp::ReplaceMany(members), Cardinality::Many) => {
                let mut deduped: Vec<ResourceIdentifier> = Vec::new();
                for member in members {
                    if !deduped.contains(member) {
                        deduped.push(member.clone());
                    }
                }
                Linkage::Many(deduped)
            }
            (LinkageOp::Add(members), Cardinality::Many) => {
                let mut merged = old.clone();
                for member in members {
                    if !merged.contains(member) {
                        merged.push(member.clone());
                    }
                }
                Linkage::Many(merged)
            }
            (LinkageOp::Remove(members), Cardinality::Many) => {
                Linkage::Many(old.iter().filter(|m| !members.contains(m)).cloned().collect())
            }
            _ => {
                return Err(StoreError::Internal(format!(
                    "linkage operation does not match cardinality of {}.{}",
                    descriptor.type_name(),
                    relationship.name()
                )));
            }
        };

        let new = linkage_identifiers(Some(&new_linkage));
        if let Some(row) = tables.row_mut(identifier) {
            row.links
                .insert(relationship.name().to_string(), new_linkage.clone());
        }
        for removed in old.iter().filter(|member| !new.contains(member)) {
            remove_inverse(&mut tables, identifier, relationship, removed);
        }
        for added in new.iter().filter(|member| !old.contains(member)) {
            set_inverse(&mut tables, &self.registry, identifier, relationship, added);
        }
        debug!(
            type_name = %identifier.type_name,
            id = %identifier.id,
            relationship = relationship.name(),
            "mutated relationship linkage"
        );

        Ok(match &new_linkage {
            Linkage::One(member) => {
                RelatedValue::One(member.as_ref().map(|m| Box::new(Resource::linkage_stub(m))))
            }
            Linkage::Many(members) => {
                RelatedValue::Many(members.iter().map(Resource::linkage_stub).collect())
            }
        })
    }
}

fn linkage_identifiers(linkage: Option<&Linkage>) -> Vec<ResourceIdentifier> {
    match linkage {
        Some(Linkage::One(Some(member))) => vec![member.clone()],
        Some(Linkage::Many(members)) => members.clone(),
        _ => Vec::new(),
    }
}

fn presence_satisfied(resource: &Resource, field: &str, via_inverse: Option<&str>) -> bool {
    if via_inverse == Some(field) {
        return true;
    }
    if let Some(value) = resource.attribute(field) {
        return !(value.is_null() || value.as_str().is_some_and(|text| text.trim().is_empty()));
    }
    match resource.related(field) {
        Some(RelatedValue::One(linked)) => linked.is_some(),
        Some(RelatedValue::Many(linked)) => !linked.is_empty(),
        None => false,
    }
}

fn value_taken(
    tables: &Tables,
    type_name: &str,
    self_id: Option<&str>,
    field: &str,
    value: &Value,
) -> bool {
    tables.rows.get(type_name).is_some_and(|rows| {
        rows.iter().any(|(id, row)| {
            Some(id.as_str()) != self_id && row.attributes.get(field) == Some(value)
        })
    })
}

fn value_matches(value: Option<&Value>, want: &str) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => text == want,
        Some(other) => other.to_string() == want,
    }
}

fn render_scalar(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

/// Points `child`'s declared inverse at `owner`, displacing a previous
/// to-one parent's forward linkage when necessary.
fn set_inverse(
    tables: &mut Tables,
    registry: &ResourceRegistry,
    owner: &ResourceIdentifier,
    relationship: &RelationshipDescriptor,
    child: &ResourceIdentifier,
) {
    let Some(inverse) = relationship.inverse_name() else {
        return;
    };
    let Some(inverse_rel) = registry
        .descriptor(relationship.target())
        .and_then(|target| target.relationship(inverse))
    else {
        return;
    };

    match inverse_rel.cardinality() {
        Cardinality::One => {
            let previous = match tables.row(child).and_then(|row| row.links.get(inverse)) {
                Some(Linkage::One(Some(previous))) if previous != owner => Some(previous.clone()),
                _ => None,
            };
            if let Some(previous) = previous {
                if let Some(row) = tables.row_mut(&previous) {
                    match row.links.get_mut(relationship.name()) {
                        Some(Linkage::Many(members)) => members.retain(|member| member != child),
                        Some(Linkage::One(slot)) => {
                            if slot.as_ref() == Some(child) {
                                *slot = None;
                            }
                        }
                        None => {}
                    }
                }
            }
            if let Some(row) = tables.row_mut(child) {
                row.links
                    .insert(inverse.to_string(), Linkage::One(Some(owner.clone())));
            }
        }
        Cardinality::Many => {
            if let Some(row) = tables.row_mut(child) {
                let linkage = row
                    .links
                    .entry(inverse.to_string())
                    .or_insert_with(|| Linkage::Many(Vec::new()));
                if let Linkage::Many(members) = linkage {
                    if !members.contains(owner) {
                        members.push(owner.clone());
                    }
                }
            }
        }
    }
}

fn remove_inverse(
    tables: &mut Tables,
    owner: &ResourceIdentifier,
    relationship: &RelationshipDescriptor,
    child: &ResourceIdentifier,
) {
    let Some(inverse) = relationship.inverse_name() else {
        return;
    };
    if let Some(row) = tables.row_mut(child) {
        match row.links.get_mut(inverse) {
            Some(Linkage::One(slot)) => {
                if slot.as_ref() == Some(owner) {
                    *slot = None;
                }
            }
            Some(Linkage::Many(members)) => members.retain(|member| member != owner),
            None => {}
        }
    }
}
