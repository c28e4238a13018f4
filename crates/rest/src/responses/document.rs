//! JSON:API document rendering.
//!
//! The renderer turns [`Resource`] graphs into response documents. Output
//! always uses public names: aliased type names for primary data, included
//! entries and relationship identifiers, and aliased attribute names
//! filtered by the request's sparse fieldsets. Relationship objects carry
//! `self`/`related` links for routed types and linkage data unless the
//! optimize-relationships mode suppresses it for non-included paths.

use serde_json::{Map, Value, json};

use arbor_core::query::QuerySpec;
use arbor_core::resource::{RelatedValue, Resource};
use arbor_core::schema::{Cardinality, RelationshipDescriptor, ResourceDescriptor, ResourceRegistry};
use arbor_persistence::scope::{Selection, Window};

use crate::config::ServerConfig;

/// Renders response documents for one request.
pub struct DocumentRenderer<'a> {
    registry: &'a ResourceRegistry,
    config: &'a ServerConfig,
    spec: &'a QuerySpec,
}

impl<'a> DocumentRenderer<'a> {
    /// Creates a renderer over the given schema, configuration and query.
    pub fn new(registry: &'a ResourceRegistry, config: &'a ServerConfig, spec: &'a QuerySpec) -> Self {
        Self {
            registry,
            config,
            spec,
        }
    }

    /// Renders a single-resource document.
    pub fn single(&self, resource: &Resource, included: &[(Vec<String>, Resource)]) -> Value {
        let mut document = Map::new();
        document.insert("data".to_string(), self.resource_object(resource, &[]));
        self.attach_included(&mut document, included);
        Value::Object(document)
    }

    /// Renders a to-one related-data document; `None` renders `data: null`.
    pub fn maybe_single(
        &self,
        resource: Option<&Resource>,
        included: &[(Vec<String>, Resource)],
    ) -> Value {
        let mut document = Map::new();
        let data = match resource {
            Some(resource) => self.resource_object(resource, &[]),
            None => Value::Null,
        };
        document.insert("data".to_string(), data);
        self.attach_included(&mut document, included);
        Value::Object(document)
    }

    /// Renders a collection document with pagination meta and links.
    ///
    /// `window` is the window the selection was evaluated under; meta and
    /// links derive from its resolution against the selection total.
    pub fn collection(
        &self,
        type_name: &str,
        selection: &Selection,
        window: Window,
        included: &[(Vec<String>, Resource)],
    ) -> Value {
        let data: Vec<Value> = selection
            .resources
            .iter()
            .map(|resource| self.resource_object(resource, &[]))
            .collect();

        let mut document = Map::new();
        document.insert("data".to_string(), Value::Array(data));
        self.attach_included(&mut document, included);

        let public_type = self.public_type(type_name);
        let resolved = window.resolve(selection.total);
        let page = PageWindow::from_resolved(selection.total, resolved.start, resolved.limit);

        document.insert(
            "meta".to_string(),
            json!({
                "total": selection.total,
                "page_size": page.size,
                "page_number": page.number,
            }),
        );
        document.insert(
            "links".to_string(),
            self.pagination_links(&public_type, &page),
        );

        Value::Object(document)
    }

    /// Renders an identifier-only linkage document for a relationship
    /// endpoint, with the relationship's own links.
    pub fn linkage(
        &self,
        owner: &Resource,
        relationship: &RelationshipDescriptor,
        value: &RelatedValue,
    ) -> Value {
        let mut document = Map::new();

        if let Some(descriptor) = self.registry.descriptor(owner.type_name()) {
            if let Some(links) = self.relationship_links(descriptor, owner, relationship) {
                document.insert("links".to_string(), links);
            }
        }

        let data = match value {
            RelatedValue::One(resource) => match resource {
                Some(resource) => self.identifier_object(resource),
                None => Value::Null,
            },
            RelatedValue::Many(resources) => Value::Array(
                resources
                    .iter()
                    .map(|resource| self.identifier_object(resource))
                    .collect(),
            ),
        };
        document.insert("data".to_string(), data);

        Value::Object(document)
    }

    /// Renders one resource object at `path`, the include chain under
    /// which it appears (empty for primary data).
    pub fn resource_object(&self, resource: &Resource, path: &[String]) -> Value {
        let Some(descriptor) = self.registry.descriptor(resource.type_name()) else {
            // Unregistered types render as bare identifiers.
            return self.identifier_object(resource);
        };

        let public_type = descriptor.public_type().to_string();
        let mut object = Map::new();
        object.insert("type".to_string(), json!(public_type));
        if let Some(id) = resource.id() {
            object.insert("id".to_string(), json!(id));
        }

        let fieldset = self.spec.fieldset(&public_type);
        let mut attributes = Map::new();
        for (name, value) in resource.attributes() {
            let public = descriptor.alias_for(name);
            if let Some(fieldset) = fieldset {
                if !fieldset.contains(public) {
                    continue;
                }
            }
            attributes.insert(public.to_string(), value.clone());
        }
        object.insert("attributes".to_string(), Value::Object(attributes));

        let mut relationships = Map::new();
        for relationship in descriptor.relationships() {
            let rendered = self.relationship_object(descriptor, resource, relationship, path);
            if let Value::Object(map) = &rendered {
                if map.is_empty() {
                    continue;
                }
            }
            let public_name = descriptor.alias_for(relationship.name()).to_string();
            relationships.insert(public_name, rendered);
        }
        if !relationships.is_empty() {
            object.insert("relationships".to_string(), Value::Object(relationships));
        }

        Value::Object(object)
    }

    fn relationship_object(
        &self,
        descriptor: &ResourceDescriptor,
        owner: &Resource,
        relationship: &RelationshipDescriptor,
        path: &[String],
    ) -> Value {
        let mut object = Map::new();

        if let Some(links) = self.relationship_links(descriptor, owner, relationship) {
            object.insert("links".to_string(), links);
        }

        if self.linkage_wanted(relationship.name(), path) {
            let data = match owner.related(relationship.name()) {
                Some(RelatedValue::One(resource)) => match resource {
                    Some(resource) => self.identifier_object(resource),
                    None => Value::Null,
                },
                Some(RelatedValue::Many(resources)) => Value::Array(
                    resources
                        .iter()
                        .map(|resource| self.identifier_object(resource))
                        .collect(),
                ),
                // Unloaded slots still render an empty linkage so the
                // relationship's shape is visible.
                None => match relationship.cardinality() {
                    Cardinality::One => Value::Null,
                    Cardinality::Many => Value::Array(Vec::new()),
                },
            };
            object.insert("data".to_string(), data);
        }

        Value::Object(object)
    }

    fn relationship_links(
        &self,
        descriptor: &ResourceDescriptor,
        owner: &Resource,
        relationship: &RelationshipDescriptor,
    ) -> Option<Value> {
        if !self.config.relationship_links || !descriptor.is_routed() {
            return None;
        }
        let id = owner.id()?;
        let base = self.config.api_base();
        let public_type = descriptor.public_type();
        let public_name = descriptor.alias_for(relationship.name());
        Some(json!({
            "self": format!("{}/{}/{}/relationships/{}", base, public_type, id, public_name),
            "related": format!("{}/{}/{}/{}", base, public_type, id, public_name),
        }))
    }

    fn linkage_wanted(&self, relationship: &str, path: &[String]) -> bool {
        if !self.config.optimize_relationships {
            return true;
        }
        let mut full: Vec<&str> = path.iter().map(String::as_str).collect();
        full.push(relationship);
        self.spec.includes_path(&full)
    }

    /// Renders a `{type, id}` identifier under the public type name.
    pub fn identifier_object(&self, resource: &Resource) -> Value {
        json!({
            "type": self.public_type(resource.type_name()),
            "id": resource.id().unwrap_or_default(),
        })
    }

    fn attach_included(&self, document: &mut Map<String, Value>, included: &[(Vec<String>, Resource)]) {
        if self.spec.include.is_empty() {
            return;
        }
        let entries: Vec<Value> = included
            .iter()
            .map(|(path, resource)| self.resource_object(resource, path))
            .collect();
        document.insert("included".to_string(), Value::Array(entries));
    }

    fn public_type(&self, type_name: &str) -> String {
        self.registry
            .descriptor(type_name)
            .map(|descriptor| descriptor.public_type().to_string())
            .unwrap_or_else(|| type_name.to_string())
    }

    fn pagination_links(&self, public_type: &str, page: &PageWindow) -> Value {
        let base = format!("{}/{}", self.config.api_base(), public_type);
        let url = |number: u64| {
            format!(
                "{}?page[number]={}&page[size]={}",
                base, number, page.size
            )
        };

        let mut links = Map::new();
        links.insert("self".to_string(), json!(url(page.number)));
        links.insert("first".to_string(), json!(url(1)));
        links.insert("last".to_string(), json!(url(page.last)));
        if page.number > 1 {
            links.insert("prev".to_string(), json!(url(page.number - 1)));
        }
        if page.has_next {
            links.insert("next".to_string(), json!(url(page.number + 1)));
        }
        Value::Object(links)
    }
}

/// Page arithmetic over a resolved window.
struct PageWindow {
    number: u64,
    size: u64,
    last: u64,
    has_next: bool,
}

impl PageWindow {
    fn from_resolved(total: u64, start: u64, limit: u64) -> Self {
        if limit == 0 {
            return Self {
                number: 1,
                size: 0,
                last: 1,
                has_next: false,
            };
        }
        let number = start / limit + 1;
        let last = total.div_ceil(limit).max(1);
        Self {
            number,
            size: limit,
            last,
            has_next: start + limit < total,
        }
    }
}
