//! Route configuration for the JSON:API engine.
//!
//! This module contains the routing configuration that maps HTTP paths
//! to the generic resource handlers.

pub mod api_routes;

pub use api_routes::create_routes;
