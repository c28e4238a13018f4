//! Record creation.

use arbor_core::alias::EngagedAliases;
use arbor_core::hooks::HookStage;
use arbor_core::resource::Resource;
use arbor_persistence::StoreError;
use arbor_persistence::store::RecordStore;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;

use crate::builder::ResourceGraphBuilder;
use crate::error::{RestError, RestResult};
use crate::extractors::{JsonApiDocument, QueryOptions};
use crate::planner::QueryPlanner;
use crate::responses::{DocumentRenderer, collect_included};
use crate::state::AppState;

use super::{json_response, missing_data, record_invalid, routed_descriptor, run_stage};

/// `POST /{type}`: builds a record graph from the request document,
/// validates and saves it, and renders the saved record.
///
/// The document's fields are intersected with the type's create permit
/// set. Lifecycle stages fire around the save; validation failures render
/// as 422 documents with pointers into the request. Success answers 201
/// with a `Location` header for the new record.
pub async fn create<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(type_segment): Path<String>,
    options: QueryOptions,
    document: JsonApiDocument,
) -> RestResult<Response> {
    let descriptor = routed_descriptor(state.registry(), &type_segment)?;
    let type_name = descriptor.type_name().to_string();
    let public_type = descriptor.public_type().to_string();

    let planner = QueryPlanner::new(state.registry(), descriptor, state.config());
    let spec = planner.plan(&options)?;

    let permitted = state
        .permits()
        .for_create(&type_name)
        .ok_or_else(|| RestError::Internal {
            message: format!("no create permits registered for {}", type_name),
        })?;

    let Some(data) = document.data() else {
        return Err(missing_data());
    };

    let mut resource = Resource::new(&type_name);
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

    run_stage(state.hooks(), &type_name, HookStage::AfterInitialize, &mut resource)?;
    run_stage(state.hooks(), &type_name, HookStage::BeforeCreate, &mut resource)?;
    run_stage(state.hooks(), &type_name, HookStage::BeforeSave, &mut resource)?;

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

    run_stage(state.hooks(), &type_name, HookStage::AfterCreate, &mut resource)?;
    run_stage(state.hooks(), &type_name, HookStage::AfterSave, &mut resource)?;

    let id = resource
        .id()
        .map(str::to_string)
        .ok_or_else(|| RestError::Internal {
            message: format!("saved {} record has no id", type_name),
        })?;
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

    let mut response = json_response(state.config(), StatusCode::CREATED, body);
    let location = format!("{}/{}/{}", state.api_base(), public_type, id);
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}
