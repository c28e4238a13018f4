//! Field error rendering.
//!
//! Turns the [`Errors`] accumulated on a resource into JSON:API error
//! objects: each entry gets a document pointer resolved against the schema
//! (echoing engaged aliases) and a detail string from the message catalog.

use arbor_core::alias::EngagedAliases;
use arbor_core::error::Errors;
use arbor_core::messages::MessageResolver;
use arbor_core::pointer::resolve_pointer;
use arbor_core::schema::ResourceRegistry;
use axum::http::StatusCode;

use crate::error::ErrorObject;

/// Renders validation errors on a resource of `root_type` into error
/// objects with pointers into the request document.
pub fn render_record_errors(
    registry: &ResourceRegistry,
    messages: &dyn MessageResolver,
    root_type: &str,
    errors: &Errors,
    engaged: Option<&EngagedAliases>,
) -> Vec<ErrorObject> {
    errors
        .iter()
        .map(|entry| {
            let pointer = resolve_pointer(registry, root_type, entry.field.as_deref(), engaged);
            ErrorObject::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                entry.code.as_str(),
                messages.resolve(entry),
            )
            .pointer(pointer)
        })
        .collect()
}
