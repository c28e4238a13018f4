//! Relationship linkage endpoints.
//!
//! `GET` renders the identifier-only linkage document for a relationship.
//! Mutations run against the linkage itself and answer 204 on success:
//! `PATCH` replaces (or, without a `data` member, clears) the linkage,
//! `POST` appends to a to-many and `DELETE` removes from one. To-one
//! linkage only answers `PATCH`. Every mutation requires the relationship
//! in the type's update permit set.

use arbor_core::query::QuerySpec;
use arbor_core::resource::{RelatedValue, ResourceIdentifier};
use arbor_core::schema::{Cardinality, RelationshipDescriptor, ResourceDescriptor};
use arbor_persistence::StoreError;
use arbor_persistence::store::{LinkageOp, RecordStore};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::error::{RestError, RestResult};
use crate::extractors::JsonApiDocument;
use crate::responses::DocumentRenderer;
use crate::state::AppState;

use super::{document_error, json_response, routed_descriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkageVerb {
    Replace,
    Append,
    Remove,
}

/// `GET /{type}/{id}/relationships/{rel}`: renders the relationship's
/// linkage document with identifier-only data.
pub async fn show_relationship<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path((type_segment, id, rel_segment)): Path<(String, String, String)>,
) -> RestResult<Response> {
    let descriptor = routed_descriptor(state.registry(), &type_segment)?;
    let type_name = descriptor.type_name().to_string();
    let internal = descriptor.unalias(&rel_segment).to_string();
    let Some(relationship) = descriptor.relationship(&internal) else {
        return Err(RestError::AssociationNotFound {
            type_name,
            relationship: rel_segment,
        });
    };

    let owner = state.store().find(&type_name, &id).await?;
    let value = match owner.related(&internal) {
        Some(value) => value.clone(),
        None => match relationship.cardinality() {
            Cardinality::One => RelatedValue::One(None),
            Cardinality::Many => RelatedValue::Many(Vec::new()),
        },
    };

    let spec = QuerySpec::new();
    let renderer = DocumentRenderer::new(state.registry(), state.config(), &spec);
    let body = renderer.linkage(&owner, relationship, &value);
    Ok(json_response(state.config(), StatusCode::OK, body))
}

/// `PATCH /{type}/{id}/relationships/{rel}`: replaces the linkage, or
/// clears it when the document has no `data` member.
pub async fn replace_relationship<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(params): Path<(String, String, String)>,
    document: JsonApiDocument,
) -> RestResult<Response> {
    mutate(state, params, LinkageVerb::Replace, document).await
}

/// `POST /{type}/{id}/relationships/{rel}`: appends identifiers to a
/// to-many relationship.
pub async fn append_relationship<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(params): Path<(String, String, String)>,
    document: JsonApiDocument,
) -> RestResult<Response> {
    mutate(state, params, LinkageVerb::Append, document).await
}

/// `DELETE /{type}/{id}/relationships/{rel}`: removes identifiers from a
/// to-many relationship.
pub async fn remove_relationship<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(params): Path<(String, String, String)>,
    document: JsonApiDocument,
) -> RestResult<Response> {
    mutate(state, params, LinkageVerb::Remove, document).await
}

async fn mutate<S: RecordStore>(
    state: AppState<S>,
    (type_segment, id, rel_segment): (String, String, String),
    verb: LinkageVerb,
    document: JsonApiDocument,
) -> RestResult<Response> {
    let descriptor = routed_descriptor(state.registry(), &type_segment)?;
    let type_name = descriptor.type_name().to_string();
    let internal = descriptor.unalias(&rel_segment).to_string();
    let Some(relationship) = descriptor.relationship(&internal) else {
        return Err(RestError::AssociationNotFound {
            type_name,
            relationship: rel_segment,
        });
    };

    let allowed = state
        .permits()
        .for_update(&type_name)
        .map(|fields| fields.allows(&internal))
        .unwrap_or(false);
    if !allowed {
        return Err(RestError::Forbidden {
            detail: format!("Relationship '{}' cannot be modified", rel_segment),
        });
    }

    let owner = state.store().find(&type_name, &id).await?;
    let Some(identifier) = owner.identifier() else {
        return Err(RestError::Internal {
            message: format!("loaded {} record has no id", type_name),
        });
    };

    let target = state
        .registry()
        .descriptor(relationship.target())
        .ok_or_else(|| RestError::Internal {
            message: format!(
                "relationship {}.{} targets unregistered type {}",
                type_name,
                internal,
                relationship.target()
            ),
        })?;

    let op = linkage_op(relationship, target, verb, document.data(), &rel_segment)?;

    match state.store().mutate_linkage(&identifier, &internal, op).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(StoreError::Invalid(_)) => Err(RestError::Forbidden {
            detail: format!("Relationship '{}' could not be modified", rel_segment),
        }),
        Err(other) => Err(other.into()),
    }
}

fn linkage_op(
    relationship: &RelationshipDescriptor,
    target: &ResourceDescriptor,
    verb: LinkageVerb,
    data: Option<&Value>,
    rel_segment: &str,
) -> RestResult<LinkageOp> {
    match relationship.cardinality() {
        Cardinality::One => match verb {
            LinkageVerb::Replace => match data {
                None | Some(Value::Null) => Ok(LinkageOp::ReplaceOne(None)),
                Some(value) => Ok(LinkageOp::ReplaceOne(Some(parse_identifier(
                    target, value, "/data",
                )?))),
            },
            LinkageVerb::Append | LinkageVerb::Remove => Err(RestError::Forbidden {
                detail: format!(
                    "Relationship '{}' is to-one and only supports replacement",
                    rel_segment
                ),
            }),
        },
        Cardinality::Many => {
            let identifiers = match data {
                None if verb == LinkageVerb::Replace => Vec::new(),
                None => return Err(super::missing_data()),
                Some(Value::Array(items)) => {
                    let mut identifiers = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        let pointer = format!("/data/{}", index);
                        identifiers.push(parse_identifier(target, item, &pointer)?);
                    }
                    identifiers
                }
                Some(_) => return Err(document_error("invalid", "is invalid", "/data")),
            };
            Ok(match verb {
                LinkageVerb::Replace => LinkageOp::ReplaceMany(identifiers),
                LinkageVerb::Append => LinkageOp::Add(identifiers),
                LinkageVerb::Remove => LinkageOp::Remove(identifiers),
            })
        }
    }
}

/// Parses one `{type, id}` identifier object, accepting the target's
/// public or canonical type name.
fn parse_identifier(
    target: &ResourceDescriptor,
    value: &Value,
    pointer: &str,
) -> RestResult<ResourceIdentifier> {
    let Some(object) = value.as_object() else {
        return Err(document_error("invalid", "is invalid", pointer));
    };
    let Some(given) = object.get("type").and_then(Value::as_str) else {
        return Err(document_error(
            "blank",
            "can't be blank",
            &format!("{}/type", pointer),
        ));
    };
    if given != target.type_name() && given != target.public_type() {
        return Err(document_error(
            "invalid_type",
            "is not a valid type",
            &format!("{}/type", pointer),
        ));
    }
    let Some(id) = object.get("id").and_then(Value::as_str) else {
        return Err(document_error(
            "blank",
            "can't be blank",
            &format!("{}/id", pointer),
        ));
    };
    Ok(ResourceIdentifier::new(target.type_name(), id))
}
