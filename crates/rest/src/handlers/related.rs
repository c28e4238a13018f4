//! Related-data endpoints.
//!
//! `GET /{type}/{id}/{rel}` renders the records behind a relationship as
//! a full document: a nullable single resource for to-one, a filterable,
//! sortable, paginated collection for to-many. The query is planned
//! against the target type's schema, so filters and sorts use the
//! target's public field names. `GET /{type}/{id}/{rel}/{rel_id}` picks
//! one record out of the relationship and 404s when it is not there.

use arbor_core::resource::Resource;
use arbor_core::schema::{Cardinality, RelationshipDescriptor, ResourceDescriptor};
use arbor_persistence::scope::{Selection, sort_resources};
use arbor_persistence::store::RecordStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::error::{RestError, RestResult};
use crate::extractors::QueryOptions;
use crate::planner::QueryPlanner;
use crate::responses::{DocumentRenderer, collect_included};
use crate::state::AppState;

use super::{json_response, routed_descriptor};

/// `GET /{type}/{id}/{rel}`: renders the related records.
pub async fn related<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path((type_segment, id, rel_segment)): Path<(String, String, String)>,
    options: QueryOptions,
) -> RestResult<Response> {
    let (relationship, records) =
        load_relationship(&state, &type_segment, &id, &rel_segment).await?;
    let target = target_descriptor(&state, relationship)?;

    let planner = QueryPlanner::new(state.registry(), target, state.config());
    let spec = planner.plan(&options)?;
    let renderer = DocumentRenderer::new(state.registry(), state.config(), &spec);

    match relationship.cardinality() {
        Cardinality::One => {
            let included = collect_included(
                state.store(),
                state.scope_policy(),
                &records,
                &spec.include,
            )
            .await?;
            let body = renderer.maybe_single(records.first(), &included);
            Ok(json_response(state.config(), StatusCode::OK, body))
        }
        Cardinality::Many => {
            let scope = planner.scope(&spec);
            let mut records: Vec<Resource> = records
                .into_iter()
                .filter(|record| {
                    scope
                        .filter
                        .iter()
                        .all(|(field, want)| matches_filter(record, field, want))
                })
                .collect();
            // Without sort keys the linkage's own order stands.
            if !scope.sort.is_empty() {
                sort_resources(&mut records, &scope.sort);
            }

            let total = records.len() as u64;
            let resolved = scope.window.resolve(total);
            let resources: Vec<Resource> = records
                .into_iter()
                .skip(resolved.start as usize)
                .take(resolved.limit as usize)
                .collect();
            let selection = Selection { resources, total };

            let included = collect_included(
                state.store(),
                state.scope_policy(),
                &selection.resources,
                &spec.include,
            )
            .await?;
            let body =
                renderer.collection(relationship.target(), &selection, scope.window, &included);
            Ok(json_response(state.config(), StatusCode::OK, body))
        }
    }
}

/// `GET /{type}/{id}/{rel}/{rel_id}`: renders one record out of the
/// relationship, 404 when the relationship does not contain it.
pub async fn related_show<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path((type_segment, id, rel_segment, rel_id)): Path<(String, String, String, String)>,
    options: QueryOptions,
) -> RestResult<Response> {
    let (relationship, records) =
        load_relationship(&state, &type_segment, &id, &rel_segment).await?;
    let target = target_descriptor(&state, relationship)?;

    let planner = QueryPlanner::new(state.registry(), target, state.config());
    let spec = planner.plan(&options)?;

    let Some(record) = records
        .into_iter()
        .find(|record| record.id() == Some(rel_id.as_str()))
    else {
        return Err(RestError::NotFound {
            type_name: target.public_type().to_string(),
            id: rel_id,
        });
    };

    let included = collect_included(
        state.store(),
        state.scope_policy(),
        std::slice::from_ref(&record),
        &spec.include,
    )
    .await?;

    let renderer = DocumentRenderer::new(state.registry(), state.config(), &spec);
    let body = renderer.single(&record, &included);
    Ok(json_response(state.config(), StatusCode::OK, body))
}

/// Loads the full records behind one relationship of one record, after
/// the scope policy's relationship filter.
async fn load_relationship<'a, S: RecordStore>(
    state: &'a AppState<S>,
    type_segment: &str,
    id: &str,
    rel_segment: &str,
) -> RestResult<(&'a RelationshipDescriptor, Vec<Resource>)> {
    let descriptor = routed_descriptor(state.registry(), type_segment)?;
    let type_name = descriptor.type_name().to_string();
    let internal = descriptor.unalias(rel_segment).to_string();
    let Some(relationship) = descriptor.relationship(&internal) else {
        return Err(RestError::AssociationNotFound {
            type_name,
            relationship: rel_segment.to_string(),
        });
    };

    let owner = state.store().find(&type_name, id).await?;
    let Some(identifier) = owner.identifier() else {
        return Err(RestError::Internal {
            message: format!("loaded {} record has no id", type_name),
        });
    };

    let value = state.store().load_related(&identifier, &internal).await?;
    let records: Vec<Resource> = value.iter().cloned().collect();
    let records = state
        .scope_policy()
        .relationship(&type_name, &internal, records);
    Ok((relationship, records))
}

fn target_descriptor<'a, S>(
    state: &'a AppState<S>,
    relationship: &RelationshipDescriptor,
) -> RestResult<&'a ResourceDescriptor>
where
    S: RecordStore,
{
    state
        .registry()
        .descriptor(relationship.target())
        .ok_or_else(|| RestError::Internal {
            message: format!(
                "relationship targets unregistered type {}",
                relationship.target()
            ),
        })
}

/// Mirrors the store's filter semantics for records already in memory:
/// absent and null values never match, strings compare directly and
/// everything else compares through its JSON rendering.
fn matches_filter(resource: &Resource, field: &str, want: &str) -> bool {
    match resource.attribute(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(actual)) => actual == want,
        Some(other) => other.to_string() == *want,
    }
}
