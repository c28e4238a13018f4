//! JSON:API response building.
//!
//! This module turns resource graphs back into JSON:API documents:
//!
//! - [`DocumentRenderer`] - Resource objects, collections, pagination
//!   meta/links and linkage, all under public (aliased) names
//! - [`collect_included`] - Walks `include` paths through the store and
//!   gathers the deduplicated side-loaded records
//! - [`render_record_errors`] - Field errors to JSON:API error objects
//!   with document pointers and catalog-resolved details

pub mod document;
pub mod errors;
pub mod included;

pub use document::DocumentRenderer;
pub use errors::render_record_errors;
pub use included::collect_included;
