//! Application state for the JSON:API engine.
//!
//! This module defines the shared application state that is available to all
//! request handlers. It bundles the record store, the resource registry, the
//! permitted-field table, lifecycle hooks, the message catalog and server
//! configuration.

use std::sync::Arc;

use arbor_core::hooks::HookRegistry;
use arbor_core::messages::MessageCatalog;
use arbor_core::resource::Resource;
use arbor_core::schema::ResourceRegistry;
use arbor_core::PermitTable;
use arbor_persistence::scope::Scope;
use arbor_persistence::store::RecordStore;

use crate::config::ServerConfig;

/// Per-request scope adjustment applied before reads are evaluated.
///
/// Applications implement this to narrow what a request can see, for
/// example restricting collections to the records a caller owns. The
/// default implementation passes everything through unchanged.
pub trait ScopePolicy: Send + Sync {
    /// Adjusts the scope evaluated for a collection read of `type_name`.
    fn collection(&self, _type_name: &str, scope: Scope) -> Scope {
        scope
    }

    /// Filters the records loaded under a relationship before they are
    /// rendered or included.
    fn relationship(
        &self,
        _type_name: &str,
        _relationship: &str,
        records: Vec<Resource>,
    ) -> Vec<Resource> {
        records
    }
}

/// The default policy: every scope passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnscopedPolicy;

impl ScopePolicy for UnscopedPolicy {}

/// Shared application state for the REST layer.
///
/// This struct holds everything handlers need: the record store, the schema
/// registry the routes are generated from, field permissions, hooks and
/// configuration.
///
/// # Type Parameters
///
/// * `S` - The record store type (must implement [`RecordStore`])
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
///
/// use arbor_rest::{AppState, ServerConfig};
/// use arbor_persistence::memory::MemoryStore;
///
/// let store = MemoryStore::new(Arc::clone(&registry));
/// let state = AppState::new(Arc::new(store), registry, ServerConfig::default());
/// ```
pub struct AppState<S> {
    /// The record store.
    store: Arc<S>,

    /// The resource schema registry.
    registry: Arc<ResourceRegistry>,

    /// Permitted fields per type and write kind.
    permits: Arc<PermitTable>,

    /// Lifecycle hooks.
    hooks: Arc<HookRegistry>,

    /// Error detail templates.
    messages: Arc<MessageCatalog>,

    /// Read scoping seam.
    scope_policy: Arc<dyn ScopePolicy>,

    /// Server configuration.
    config: Arc<ServerConfig>,
}

// Manually implement Clone since S is wrapped in Arc and doesn't need to be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            permits: Arc::clone(&self.permits),
            hooks: Arc::clone(&self.hooks),
            messages: Arc::clone(&self.messages),
            scope_policy: Arc::clone(&self.scope_policy),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: RecordStore> AppState<S> {
    /// Creates a new AppState with the given store, registry and
    /// configuration.
    ///
    /// Permits default to empty (no writable fields), hooks to none and
    /// messages to the built-in defaults. Use the `with_*` methods to
    /// replace them.
    pub fn new(store: Arc<S>, registry: Arc<ResourceRegistry>, config: ServerConfig) -> Self {
        Self {
            store,
            registry,
            permits: Arc::new(PermitTable::default()),
            hooks: Arc::new(HookRegistry::default()),
            messages: Arc::new(MessageCatalog::with_defaults()),
            scope_policy: Arc::new(UnscopedPolicy),
            config: Arc::new(config),
        }
    }

    /// Replaces the permitted-field table.
    pub fn with_permits(mut self, permits: PermitTable) -> Self {
        self.permits = Arc::new(permits);
        self
    }

    /// Replaces the hook registry.
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Replaces the message catalog.
    pub fn with_messages(mut self, messages: MessageCatalog) -> Self {
        self.messages = Arc::new(messages);
        self
    }

    /// Replaces the scope policy.
    pub fn with_scope_policy(mut self, policy: impl ScopePolicy + 'static) -> Self {
        self.scope_policy = Arc::new(policy);
        self
    }

    /// Returns a reference to the record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a clone of the store Arc.
    pub fn store_arc(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// Returns the resource registry.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Returns a clone of the registry Arc.
    pub fn registry_arc(&self) -> Arc<ResourceRegistry> {
        Arc::clone(&self.registry)
    }

    /// Returns the permitted-field table.
    pub fn permits(&self) -> &PermitTable {
        &self.permits
    }

    /// Returns the hook registry.
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Returns the message catalog.
    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    /// Returns the scope policy.
    pub fn scope_policy(&self) -> &dyn ScopePolicy {
        self.scope_policy.as_ref()
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the base URL joined with the API namespace.
    pub fn api_base(&self) -> String {
        self.config.api_base()
    }

    /// Returns the page size applied when a request does not ask for one.
    pub fn default_page_size(&self) -> u64 {
        self.config.default_page_size
    }

    /// Returns the hard cap on requested page sizes.
    pub fn max_page_size(&self) -> u64 {
        self.config.max_page_size
    }

    /// Returns whether relationship link objects are emitted.
    pub fn relationship_links(&self) -> bool {
        self.config.relationship_links
    }

    /// Returns whether linkage is omitted for non-included paths.
    pub fn optimize_relationships(&self) -> bool {
        self.config.optimize_relationships
    }
}

#[cfg(test)]
mod tests {
    use arbor_core::schema::ResourceDescriptor;
    use arbor_persistence::memory::MemoryStore;

    use super::*;

    fn registry() -> Arc<ResourceRegistry> {
        Arc::new(
            ResourceRegistry::builder()
                .resource(ResourceDescriptor::build("posts").attribute("title").finish())
                .finish()
                .unwrap(),
        )
    }

    #[test]
    fn test_app_state_creation() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new(Arc::clone(&registry)));
        let state = AppState::new(store, registry, ServerConfig::default());

        assert!(state.registry().descriptor("posts").is_some());
        assert_eq!(state.default_page_size(), 10);
    }

    #[test]
    fn test_app_state_config_access() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new(Arc::clone(&registry)));
        let config = ServerConfig {
            base_url: "https://api.example.com".to_string(),
            namespace: "/v2".to_string(),
            default_page_size: 50,
            max_page_size: 500,
            optimize_relationships: true,
            ..Default::default()
        };
        let state = AppState::new(store, registry, config);

        assert_eq!(state.api_base(), "https://api.example.com/v2");
        assert_eq!(state.default_page_size(), 50);
        assert_eq!(state.max_page_size(), 500);
        assert!(state.optimize_relationships());
    }

    #[test]
    fn test_app_state_clone() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new(Arc::clone(&registry)));
        let state = AppState::new(store, registry, ServerConfig::default());
        let cloned = state.clone();

        assert_eq!(state.default_page_size(), cloned.default_page_size());
    }
}
