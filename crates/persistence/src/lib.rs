//! Arbor Persistence Layer
//!
//! This crate provides record storage for the Arbor JSON:API engine. It
//! defines the backend-neutral [`RecordStore`] trait that the REST layer
//! talks to, the [`Scope`] model for filtered, sorted and windowed
//! collection reads, and an in-memory backend suitable for tests and small
//! deployments.
//!
//! # Architecture
//!
//! The persistence layer is organized into several modules:
//!
//! - [`error`] - Error types for all store operations
//! - [`scope`] - Collection scoping: filters, sort keys and windows
//! - [`store`] - The [`RecordStore`] trait and linkage operations
//! - [`memory`] - The in-memory backend
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use arbor_core::schema::{ResourceDescriptor, ResourceRegistry};
//! use arbor_core::Resource;
//! use arbor_persistence::memory::MemoryStore;
//! use arbor_persistence::store::RecordStore;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(
//!     ResourceRegistry::builder()
//!         .resource(ResourceDescriptor::build("posts").attribute("title").finish())
//!         .finish()?,
//! );
//! let store = MemoryStore::new(registry);
//!
//! let mut post = Resource::new("posts");
//! post.set_attribute("title", json!("hello"));
//! store.save(&mut post).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod memory;
pub mod scope;
pub mod store;

pub use error::{RecordError, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use scope::{ResolvedWindow, Scope, Selection, Window};
pub use store::{LinkageOp, RecordStore};
