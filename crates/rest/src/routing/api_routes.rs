//! JSON:API route configuration.
//!
//! One generic route set serves every routed resource type; the type
//! segment is resolved against the schema registry per request, so
//! registering a new resource type needs no routing changes.

use arbor_persistence::store::RecordStore;
use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

/// Creates all JSON:API routes.
///
/// # Routes
///
/// ## Type-level
/// - `GET /{type}` - Collection (filter, sort, paginate, include)
/// - `POST /{type}` - Create
///
/// ## Instance-level
/// - `GET /{type}/{id}` - Read
/// - `PATCH /{type}/{id}` - Update
/// - `DELETE /{type}/{id}` - Delete
///
/// ## Relationship-level
/// - `GET /{type}/{id}/relationships/{rel}` - Linkage document
/// - `PATCH /{type}/{id}/relationships/{rel}` - Replace or clear linkage
/// - `POST /{type}/{id}/relationships/{rel}` - Append to-many linkage
/// - `DELETE /{type}/{id}/relationships/{rel}` - Remove to-many linkage
/// - `GET /{type}/{id}/{rel}` - Related records
/// - `GET /{type}/{id}/{rel}/{rel_id}` - One related record
pub fn create_routes<S>(state: AppState<S>) -> Router
where
    S: RecordStore + 'static,
{
    Router::new()
        // Type-level routes
        .route(
            "/{type}",
            get(handlers::index::<S>).post(handlers::create::<S>),
        )
        // Instance-level routes
        .route(
            "/{type}/{id}",
            get(handlers::show::<S>)
                .patch(handlers::update::<S>)
                .delete(handlers::destroy::<S>),
        )
        // Relationship-level routes
        .route(
            "/{type}/{id}/relationships/{rel}",
            get(handlers::show_relationship::<S>)
                .patch(handlers::replace_relationship::<S>)
                .post(handlers::append_relationship::<S>)
                .delete(handlers::remove_relationship::<S>),
        )
        .route("/{type}/{id}/{rel}", get(handlers::related::<S>))
        .route(
            "/{type}/{id}/{rel}/{rel_id}",
            get(handlers::related_show::<S>),
        )
        // State
        .with_state(state)
}
