//! Record updates.

use arbor_core::alias::EngagedAliases;
use arbor_core::hooks::HookStage;
use arbor_persistence::StoreError;
use arbor_persistence::store::RecordStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::builder::ResourceGraphBuilder;
use crate::error::{RestError, RestResult};
use crate::extractors::{JsonApiDocument, QueryOptions};
use crate::planner::QueryPlanner;
use crate::responses::{DocumentRenderer, collect_included};
use crate::state::AppState;

use super::{document_error, json_response, missing_data, record_invalid, routed_descriptor, run_stage};

/// `PATCH /{type}/{id}`: assigns the request document onto the stored
/// record and saves it.
///
/// The document's fields are intersected with the type's update permit
/// set. A document `id` that disagrees with the endpoint rejects the
/// request before anything is assigned.
pub async fn update<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path((type_segment, id)): Path<(String, String)>,
    options: QueryOptions,
    document: JsonApiDocument,
) -> RestResult<Response> {
    let descriptor = routed_descriptor(state.registry(), &type_segment)?;
    let type_name = descriptor.type_name().to_string();

    let planner = QueryPlanner::new(state.registry(), descriptor, state.config());
    let spec = planner.plan(&options)?;

    let permitted = state
        .permits()
        .for_update(&type_name)
        .ok_or_else(|| RestError::Internal {
            message: format!("no update permits registered for {}", type_name),
        })?;

    let mut resource = state.store().find(&type_name, &id).await?;

    let Some(data) = document.data() else {
        return Err(missing_data());
    };
    if let Some(document_id) = data.get("id").and_then(Value::as_str) {
        if document_id != id {
            return Err(document_error(
                "invalid",
                "does not match the endpoint",
                "/data/id",
            ));
        }
    }

    run_stage(state.hooks(), &type_name, HookStage::BeforeUpdate, &mut resource)?;
    run_stage(state.hooks(), &type_name, HookStage::BeforeSave, &mut resource)?;

    let mut engaged = EngagedAliases::new();
    ResourceGraphBuilder::new(state.registry(), state.store())
        .assign(&mut resource, data, permitted, &mut engaged)
        .await?;

    if !resource.errors().is_empty() {
        return Err(record_invalid(
            state.registry(),
            state.messages(),
            &type_name,
            resource.errors(),
            Some(&engaged),
        ));
    }

    if let Err(err) = state.store().save(&mut resource).await {
        return Err(match err {
            StoreError::Invalid(errors) => record_invalid(
                state.registry(),
                state.messages(),
                &type_name,
                &errors,
                Some(&engaged),
            ),
            other => other.into(),
        });
    }

    run_stage(state.hooks(), &type_name, HookStage::AfterUpdate, &mut resource)?;
    run_stage(state.hooks(), &type_name, HookStage::AfterSave, &mut resource)?;

    let saved = state.store().find(&type_name, &id).await?;
    let included = collect_included(
        state.store(),
        state.scope_policy(),
        std::slice::from_ref(&saved),
        &spec.include,
    )
    .await?;

    let renderer = DocumentRenderer::new(state.registry(), state.config(), &spec);
    let body = renderer.single(&saved, &included);
    Ok(json_response(state.config(), StatusCode::OK, body))
}
