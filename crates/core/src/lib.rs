//! # arbor-core - Resource Model for the Arbor JSON:API Engine
//!
//! This crate provides the type-level foundation of the Arbor engine: the
//! dynamic resource model, the schema registry that replaces reflection-based
//! type lookup, field/type aliasing, permitted-field trees, the field error
//! model with RFC 6901 pointer resolution, message resolution, and lifecycle
//! hooks.
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`schema`] - Resource descriptors and the startup-built registry
//! - [`alias`] - Public/internal field aliasing and engaged-alias tracking
//! - [`resource`] - The dynamic [`Resource`] record and identifiers
//! - [`fields`] - Recursive permitted-field whitelists
//! - [`error`] - Field error codes, entries and per-resource error sets
//! - [`pointer`] - JSON pointer resolution for error sources
//! - [`messages`] - Message catalog with most-specific-wins lookup
//! - [`hooks`] - Ordered lifecycle hooks per resource type
//! - [`query`] - The immutable per-request query specification
//!
//! ## Example
//!
//! ```rust
//! use arbor_core::schema::{RelationshipDescriptor, ResourceDescriptor, ResourceRegistry};
//!
//! let registry = ResourceRegistry::builder()
//!     .resource(
//!         ResourceDescriptor::build("posts")
//!             .attribute("title")
//!             .relationship(RelationshipDescriptor::to_many("comments", "comments").inverse("post"))
//!             .finish(),
//!     )
//!     .resource(
//!         ResourceDescriptor::build("comments")
//!             .public_type("reviews")
//!             .attribute("body")
//!             .alias("content", "body")
//!             .relationship(RelationshipDescriptor::to_one("post", "posts").inverse("comments"))
//!             .finish(),
//!     )
//!     .finish()
//!     .expect("registry is well formed");
//!
//! let comments = registry.descriptor("reviews").unwrap();
//! assert_eq!(comments.type_name(), "comments");
//! assert_eq!(comments.unalias("content"), "body");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod alias;
pub mod error;
pub mod fields;
pub mod hooks;
pub mod messages;
pub mod pointer;
pub mod query;
pub mod resource;
pub mod schema;

pub use alias::{EngagedAliases, FieldAliasMap};
pub use error::{ErrorCode, ErrorEntry, Errors};
pub use fields::{PermitTable, PermittedFields};
pub use hooks::{HookError, HookRegistry, HookStage};
pub use messages::{MessageCatalog, MessageResolver};
pub use query::{PageSpec, QuerySpec, SortDirection};
pub use resource::{RelatedValue, Resource, ResourceIdentifier};
pub use schema::{
    Cardinality, DeleteRule, RelationshipDescriptor, ResourceDescriptor, ResourceRegistry,
    SchemaError, Validation,
};
