//! Request handlers for the JSON:API engine.
//!
//! Every routed resource type shares one set of generic handlers, wired up
//! by the routing module:
//!
//! | Handler | Route | Description |
//! |---------|-------|-------------|
//! | [`index`] | `GET /{type}` | Filtered, sorted, paginated collection |
//! | [`show`] | `GET /{type}/{id}` | Single record |
//! | [`create`] | `POST /{type}` | Create a record graph from a document |
//! | [`update`] | `PATCH /{type}/{id}` | Update a record graph from a document |
//! | [`destroy`] | `DELETE /{type}/{id}` | Destroy a record |
//! | [`show_relationship`] | `GET /{type}/{id}/relationships/{rel}` | Linkage document |
//! | [`replace_relationship`] | `PATCH /{type}/{id}/relationships/{rel}` | Replace or clear linkage |
//! | [`append_relationship`] | `POST /{type}/{id}/relationships/{rel}` | Append to-many linkage |
//! | [`remove_relationship`] | `DELETE /{type}/{id}/relationships/{rel}` | Remove to-many linkage |
//! | [`related`] | `GET /{type}/{id}/{rel}` | Related records as a full document |
//! | [`related_show`] | `GET /{type}/{id}/{rel}/{rel_id}` | One related record |

pub mod create;
pub mod destroy;
pub mod index;
pub mod related;
pub mod relationships;
pub mod show;
pub mod update;

pub use create::create;
pub use destroy::destroy;
pub use index::index;
pub use related::{related, related_show};
pub use relationships::{
    append_relationship, remove_relationship, replace_relationship, show_relationship,
};
pub use show::show;
pub use update::update;

use arbor_core::alias::EngagedAliases;
use arbor_core::error::Errors;
use arbor_core::hooks::{HookRegistry, HookStage};
use arbor_core::messages::MessageResolver;
use arbor_core::resource::Resource;
use arbor_core::schema::{ResourceDescriptor, ResourceRegistry};
use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::MEDIA_TYPE;
use crate::config::ServerConfig;
use crate::error::{ErrorObject, RestError, RestResult};
use crate::responses::render_record_errors;

/// Resolves a URL type segment to its descriptor. Unrouted types 404 like
/// unknown ones, so they stay invisible at the HTTP surface.
pub(crate) fn routed_descriptor<'a>(
    registry: &'a ResourceRegistry,
    segment: &str,
) -> RestResult<&'a ResourceDescriptor> {
    registry
        .descriptor(segment)
        .filter(|descriptor| descriptor.is_routed())
        .ok_or_else(|| RestError::UnknownType {
            type_name: segment.to_string(),
        })
}

/// Builds a response carrying the configured JSON:API content type.
pub(crate) fn json_response(config: &ServerConfig, status: StatusCode, body: Value) -> Response {
    let content_type = HeaderValue::from_str(&config.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(MEDIA_TYPE));
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    response
}

/// Runs one lifecycle stage. A failing hook forbids the operation.
pub(crate) fn run_stage(
    hooks: &HookRegistry,
    type_name: &str,
    stage: HookStage,
    resource: &mut Resource,
) -> RestResult<()> {
    hooks
        .run(type_name, stage, resource)
        .map_err(|err| RestError::Forbidden {
            detail: err.message,
        })
}

/// Renders accumulated record errors into a 422 rejection.
pub(crate) fn record_invalid(
    registry: &ResourceRegistry,
    messages: &dyn MessageResolver,
    root_type: &str,
    errors: &Errors,
    engaged: Option<&EngagedAliases>,
) -> RestError {
    RestError::RecordInvalid {
        objects: render_record_errors(registry, messages, root_type, errors, engaged),
    }
}

/// A 422 rejection for a structurally bad spot in the request document.
pub(crate) fn document_error(code: &str, detail: &str, pointer: &str) -> RestError {
    RestError::DocumentInvalid {
        objects: vec![
            ErrorObject::new(StatusCode::UNPROCESSABLE_ENTITY, code, detail).pointer(pointer),
        ],
    }
}

/// The rejection for a write request without a `data` member.
pub(crate) fn missing_data() -> RestError {
    document_error("blank", "can't be blank", "/data")
}

#[cfg(test)]
pub(crate) async fn read_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
