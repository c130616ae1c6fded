//! Shared state for admin request handlers.

use std::sync::Arc;

use catman_core::{CatalogStore, ConnectorHost, Reconciler};

/// Shared application state for all request handlers.
///
/// Handlers mutate catalogs only through [`CatalogStore`]; the reconciler
/// reference is used solely for the readiness latch. Live updates reach the
/// engine via the filesystem watcher, never through a direct handler call.
#[derive(Clone)]
pub struct AppState {
    /// On-disk catalog store shared with the reconciler.
    pub store: CatalogStore,
    /// Host engine, queried for connector liveness only.
    pub host: Arc<dyn ConnectorHost>,
    /// Reconciler, queried for the initial-load latch only.
    pub reconciler: Arc<Reconciler>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("host", &"<ConnectorHost>")
            .field("reconciler", &self.reconciler)
            .finish()
    }
}

impl AppState {
    /// Creates state around an existing reconciler.
    #[must_use]
    pub fn new(store: CatalogStore, host: Arc<dyn ConnectorHost>, reconciler: Arc<Reconciler>) -> Self {
        Self {
            store,
            host,
            reconciler,
        }
    }
}
