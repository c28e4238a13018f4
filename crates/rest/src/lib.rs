//! # arbor-rest - JSON:API Resource Engine
//!
//! This crate provides a schema-driven [JSON:API](https://jsonapi.org)
//! server layer: declare resource types, relationships, aliases and field
//! permissions once, and every registered type gets a complete CRUD and
//! relationship API.
//!
//! ## Features
//!
//! - **Full CRUD Support**: Collection, read, create, update and delete
//!   for every routed resource type
//! - **Nested Writes**: One request document can create or update a whole
//!   record graph through its relationships
//! - **Field Aliasing**: Public attribute, relationship and type names
//!   are decoupled from internal ones; errors echo the names the client
//!   actually sent
//! - **Relationship Endpoints**: Linkage reads and mutations plus full
//!   related-record documents, with filtering and pagination on to-many
//!   data
//! - **Scoping and Hooks**: Per-request read scoping and a write
//!   lifecycle with before/after stages
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use arbor_core::schema::{ResourceDescriptor, ResourceRegistry};
//! use arbor_persistence::memory::MemoryStore;
//! use arbor_rest::{ServerConfig, create_app};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Arc::new(
//!         ResourceRegistry::builder()
//!             .resource(ResourceDescriptor::build("posts").attribute("title").finish())
//!             .finish()?,
//!     );
//!     let store = MemoryStore::new(Arc::clone(&registry));
//!
//!     let app = create_app(store, registry);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! Routes are mounted under the configured namespace (default `/api/v1`):
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | collection | GET | `/[type]?filter,sort,page,include,fields` |
//! | create | POST | `/[type]` |
//! | read | GET | `/[type]/[id]` |
//! | update | PATCH | `/[type]/[id]` |
//! | delete | DELETE | `/[type]/[id]` |
//! | linkage read | GET | `/[type]/[id]/relationships/[rel]` |
//! | linkage replace | PATCH | `/[type]/[id]/relationships/[rel]` |
//! | linkage append | POST | `/[type]/[id]/relationships/[rel]` |
//! | linkage remove | DELETE | `/[type]/[id]/relationships/[rel]` |
//! | related data | GET | `/[type]/[id]/[rel]` |
//! | related record | GET | `/[type]/[id]/[rel]/[rel_id]` |
//!
//! ## Error Handling
//!
//! All errors are returned as JSON:API error documents with appropriate
//! HTTP status codes:
//!
//! | HTTP Status | Code | Description |
//! |-------------|------|-------------|
//! | 400 | invalid_parameter | Uninterpretable query parameter |
//! | 403 | forbidden | Operation rejected by a hook or permit set |
//! | 403 | delete_restricted | Destroy refused by a restrict rule |
//! | 404 | not_found | Unknown record or resource type |
//! | 404 | association_not_found | Unknown relationship |
//! | 415 | unsupported_media_type | Wrong request content type |
//! | 422 | per-field codes | Document or record validation failure |
//! | 500 | internal | Internal server error |
//!
//! ## Configuration
//!
//! The server is configured via environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ARBOR_SERVER_PORT` | 8080 | Server port |
//! | `ARBOR_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `ARBOR_LOG_LEVEL` | info | Log level (error, warn, info, debug, trace) |
//! | `ARBOR_NAMESPACE` | /api/v1 | Path prefix the API is mounted under |
//! | `ARBOR_DEFAULT_PAGE_SIZE` | 10 | Page size when none is requested |
//! | `ARBOR_MAX_PAGE_SIZE` | 100 | Hard cap on requested page sizes |
//! | `ARBOR_RELATIONSHIP_LINKS` | true | Emit relationship link objects |
//! | `ARBOR_OPTIMIZE_RELATIONSHIPS` | false | Omit linkage for non-included paths |
//! | `ARBOR_ENABLE_CORS` | true | Enable CORS |
//! | `ARBOR_CORS_ORIGINS` | * | Allowed CORS origins |
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`error`] - Error types and JSON:API error document generation
//! - [`config`] - Server configuration
//! - [`state`] - Application state (store, schema, permits, hooks)
//! - [`extractors`] - Axum extractors for JSON:API request data
//! - [`planner`] - Query planning against the schema
//! - [`builder`] - Record graph assembly from request documents
//! - [`responses`] - Document rendering
//! - [`handlers`] - HTTP request handlers for each interaction
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod builder;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod planner;
pub mod responses;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use builder::ResourceGraphBuilder;
pub use config::ServerConfig;
pub use error::{ErrorObject, ErrorSource, RestError, RestResult};
pub use planner::QueryPlanner;
pub use responses::DocumentRenderer;
pub use state::{AppState, ScopePolicy, UnscopedPolicy};

use std::sync::Arc;

use arbor_core::schema::ResourceRegistry;
use arbor_persistence::store::RecordStore;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// The JSON:API media type.
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

/// Creates the Axum application with default configuration.
///
/// This is a convenience function that creates the app with default
/// settings and no permits, hooks or scoping. For more control, use
/// [`create_app_with_config`] or [`create_app_with_state`].
///
/// # Arguments
///
/// * `store` - The record store to serve from
/// * `registry` - The resource schema registry
pub fn create_app<S>(store: S, registry: Arc<ResourceRegistry>) -> Router
where
    S: RecordStore + 'static,
{
    create_app_with_config(store, registry, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// # Arguments
///
/// * `store` - The record store to serve from
/// * `registry` - The resource schema registry
/// * `config` - Server configuration
///
/// # Example
///
/// ```rust,ignore
/// use arbor_rest::{ServerConfig, create_app_with_config};
///
/// let config = ServerConfig {
///     port: 3000,
///     enable_cors: true,
///     ..Default::default()
/// };
/// let app = create_app_with_config(store, registry, config);
/// ```
pub fn create_app_with_config<S>(
    store: S,
    registry: Arc<ResourceRegistry>,
    config: ServerConfig,
) -> Router
where
    S: RecordStore + 'static,
{
    create_app_with_state(AppState::new(Arc::new(store), registry, config))
}

/// Creates the Axum application from a fully configured [`AppState`].
///
/// Use this entry point when the application needs permits, hooks, a
/// message catalog or a scope policy beyond the defaults.
pub fn create_app_with_state<S>(state: AppState<S>) -> Router
where
    S: RecordStore + 'static,
{
    let config = state.config().clone();
    info!(
        namespace = %config.namespace,
        types = state.registry().descriptors().count(),
        "creating JSON:API server"
    );

    // Build the router with all resource routes, mounted under the
    // configured namespace.
    let api = routing::create_routes(state);
    let router = if config.namespace.is_empty() {
        api
    } else {
        Router::new().nest(&config.namespace, api)
    };

    // Build middleware stack
    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    // Add CORS if enabled
    let router = if config.enable_cors {
        let cors = build_cors_layer(&config);
        router.layer(cors)
    } else {
        router
    };

    // Apply remaining middleware
    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    // Configure origins
    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    // Configure methods
    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    // Configure headers
    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("arbor_rest={},tower_http=debug", level)));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
