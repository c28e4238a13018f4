//! Side-loaded resource collection.
//!
//! Walks the request's `include` paths through the store, level by level,
//! gathering every reachable record. Results are de-duplicated by
//! `(type, id)` and never repeat a primary record. Each collected record
//! keeps the include chain it was first reached under, which the renderer
//! needs to decide linkage suppression in optimize-relationships mode.

use std::collections::BTreeSet;

use arbor_core::resource::{Resource, ResourceIdentifier};
use arbor_persistence::store::RecordStore;

use crate::error::RestResult;
use crate::state::ScopePolicy;

/// Loads the records reachable from `primary` via `include` paths.
///
/// The scope policy's relationship hook filters each loaded level before
/// traversal continues, so records it hides are neither included nor
/// descended into.
pub async fn collect_included<S: RecordStore>(
    store: &S,
    policy: &dyn ScopePolicy,
    primary: &[Resource],
    include: &[Vec<String>],
) -> RestResult<Vec<(Vec<String>, Resource)>> {
    let mut seen: BTreeSet<ResourceIdentifier> =
        primary.iter().filter_map(Resource::identifier).collect();
    let mut collected = Vec::new();

    for path in include {
        let mut frontier: Vec<Resource> = primary.to_vec();
        let mut prefix: Vec<String> = Vec::new();

        for segment in path {
            prefix.push(segment.clone());
            let mut next = Vec::new();

            for record in &frontier {
                let Some(identifier) = record.identifier() else {
                    continue;
                };
                let related = store.load_related(&identifier, segment).await?;
                let loaded: Vec<Resource> = related.iter().cloned().collect();
                let loaded = policy.relationship(record.type_name(), segment, loaded);
                next.extend(loaded);
            }

            for record in &next {
                if let Some(identifier) = record.identifier() {
                    if seen.insert(identifier) {
                        collected.push((prefix.clone(), record.clone()));
                    }
                }
            }

            frontier = next;
        }
    }

    Ok(collected)
}
