//! Single-record reads.

use arbor_persistence::store::RecordStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;

use crate::error::RestResult;
use crate::extractors::QueryOptions;
use crate::planner::QueryPlanner;
use crate::responses::{DocumentRenderer, collect_included};
use crate::state::AppState;

use super::{json_response, routed_descriptor};

/// `GET /{type}/{id}`: renders one record with side-loaded records for
/// `include` paths. Missing records 404 via the store lookup.
pub async fn show<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path((type_segment, id)): Path<(String, String)>,
    options: QueryOptions,
) -> RestResult<Response> {
    let descriptor = routed_descriptor(state.registry(), &type_segment)?;
    let type_name = descriptor.type_name().to_string();

    let planner = QueryPlanner::new(state.registry(), descriptor, state.config());
    let spec = planner.plan(&options)?;

    let resource = state.store().find(&type_name, &id).await?;
    let included = collect_included(
        state.store(),
        state.scope_policy(),
        std::slice::from_ref(&resource),
        &spec.include,
    )
    .await?;

    let renderer = DocumentRenderer::new(state.registry(), state.config(), &spec);
    let body = renderer.single(&resource, &included);
    Ok(json_response(state.config(), StatusCode::OK, body))
}
