//! Axum extractors for JSON:API requests.
//!
//! This module provides extractors for JSON:API-specific request data:
//!
//! - [`QueryOptions`] - Raw query string options (sort, filter, fields,
//!   include, pagination), parsed but not yet resolved against a schema
//! - [`JsonApiDocument`] - A request body checked for the JSON:API content
//!   type and parsed as JSON

pub mod document;
pub mod query_options;

pub use document::JsonApiDocument;
pub use query_options::QueryOptions;
