//! The record store abstraction.
//!
//! [`RecordStore`] is the seam between the REST layer and storage. It
//! speaks entirely in [`Resource`] graphs and identifier-level linkage;
//! backends decide how rows and links are kept. The crate ships one
//! backend, [`MemoryStore`](crate::memory::MemoryStore).

use arbor_core::resource::{RelatedValue, Resource, ResourceIdentifier};
use async_trait::async_trait;

use crate::error::StoreResult;
use crate::scope::{Scope, Selection};

/// One identifier-level relationship mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkageOp {
    /// Replace a to-one linkage; `None` clears it.
    ReplaceOne(Option<ResourceIdentifier>),
    /// Replace a to-many linkage wholesale.
    ReplaceMany(Vec<ResourceIdentifier>),
    /// Append identifiers to a to-many linkage, skipping ones already
    /// present.
    Add(Vec<ResourceIdentifier>),
    /// Remove identifiers from a to-many linkage; absent ones are ignored.
    Remove(Vec<ResourceIdentifier>),
}

/// Backend-neutral record storage.
///
/// `save` persists a whole resource graph atomically: the root record and
/// every nested related record either all commit or, when validation
/// fails, nothing is written. Implementations maintain declared inverse
/// linkage on both sides of every write.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Evaluates a scope over the collection of `type_name`.
    async fn select(&self, type_name: &str, scope: &Scope) -> StoreResult<Selection>;

    /// Loads one record with attributes and identifier-level relationship
    /// slots.
    async fn find(&self, type_name: &str, id: &str) -> StoreResult<Resource>;

    /// Returns true if the identified record exists.
    async fn exists(&self, identifier: &ResourceIdentifier) -> StoreResult<bool>;

    /// Validates and persists a resource graph.
    ///
    /// New records receive generated ids and timestamps; the graph is
    /// updated in place to reflect the persisted state.
    async fn save(&self, resource: &mut Resource) -> StoreResult<()>;

    /// Destroys one record, honoring the delete rules of its
    /// relationships.
    async fn destroy(&self, type_name: &str, id: &str) -> StoreResult<()>;

    /// Loads the records linked under `relationship`, attributes included.
    async fn load_related(
        &self,
        identifier: &ResourceIdentifier,
        relationship: &str,
    ) -> StoreResult<RelatedValue>;

    /// Applies one linkage mutation and returns the resulting linkage.
    ///
    /// Every referenced record must exist; inverse linkage is kept in
    /// step on the affected records.
    async fn mutate_linkage(
        &self,
        identifier: &ResourceIdentifier,
        relationship: &str,
        op: LinkageOp,
    ) -> StoreResult<RelatedValue>;
}
