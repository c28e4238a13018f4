//! Record destruction.

use arbor_core::hooks::HookStage;
use arbor_persistence::store::RecordStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::RestResult;
use crate::state::AppState;

use super::{routed_descriptor, run_stage};

/// `DELETE /{type}/{id}`: destroys one record and answers 204.
///
/// A failing before-destroy hook forbids the operation, as does a
/// restrict delete rule with dependents still attached.
pub async fn destroy<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path((type_segment, id)): Path<(String, String)>,
) -> RestResult<Response> {
    let descriptor = routed_descriptor(state.registry(), &type_segment)?;
    let type_name = descriptor.type_name().to_string();

    let mut resource = state.store().find(&type_name, &id).await?;
    run_stage(state.hooks(), &type_name, HookStage::BeforeDestroy, &mut resource)?;

    state.store().destroy(&type_name, &id).await?;

    run_stage(state.hooks(), &type_name, HookStage::AfterDestroy, &mut resource)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
