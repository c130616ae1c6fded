//! Seams to the embedding query engine.
//!
//! The reconciler never owns connector state; it drives the host through
//! [`ConnectorHost`] and publishes catalog visibility through
//! [`AnnouncementSink`]. Both are assumed thread-safe by contract, and both
//! `create`/`drop` and `add`/`remove` must be idempotent so that duplicate
//! or self-induced filesystem events are harmless.
//!
//! In-memory implementations ship here (not behind `cfg(test)`) for tests
//! and for running the manager without an embedded engine.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{CatalogError, Result};

/// Host-engine connector lifecycle operations.
#[async_trait]
pub trait ConnectorHost: Send + Sync + 'static {
    /// Instantiates (or replaces) the connector for `catalog` using the
    /// factory selected by `connector_name`.
    ///
    /// Must be idempotent: re-creating an already-loaded catalog replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::HostRejection`] when the engine refuses the
    /// connector (unknown factory, bad properties, startup failure).
    async fn create_connection(
        &self,
        catalog: &str,
        connector_name: &str,
        properties: &BTreeMap<String, String>,
    ) -> Result<()>;

    /// Drops the connector for `catalog`. A no-op for unknown catalogs.
    async fn drop_connection(&self, catalog: &str);

    /// Returns true iff a connector is currently instantiated for `catalog`.
    async fn is_loaded(&self, catalog: &str) -> bool;
}

/// Cluster-visible datasource announcement operations.
///
/// Both operations are idempotent; delivery to the cluster is
/// implementation-defined.
#[async_trait]
pub trait AnnouncementSink: Send + Sync + 'static {
    /// Adds `catalog` to the announced datasource set.
    async fn add(&self, catalog: &str);

    /// Removes `catalog` from the announced datasource set.
    async fn remove(&self, catalog: &str);
}

/// A connector instantiated by [`MemoryConnectorHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryConnector {
    /// Factory name the connector was created with.
    pub connector_name: String,
    /// Connector properties (everything except `connector.name`).
    pub properties: BTreeMap<String, String>,
}

/// In-memory [`ConnectorHost`] used by tests and engine-less deployments.
#[derive(Debug, Default)]
pub struct MemoryConnectorHost {
    connectors: RwLock<BTreeMap<String, MemoryConnector>>,
    rejected_factories: BTreeSet<String>,
}

impl MemoryConnectorHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures a connector factory name the host will refuse, for
    /// failure-injection in tests.
    #[must_use]
    pub fn with_rejected_factory(mut self, connector_name: impl Into<String>) -> Self {
        self.rejected_factories.insert(connector_name.into());
        self
    }

    /// Returns the connector instantiated for `catalog`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn connector(&self, catalog: &str) -> Option<MemoryConnector> {
        self.connectors.read().unwrap().get(catalog).cloned()
    }

    /// Names of all instantiated connectors, sorted.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn loaded_catalogs(&self) -> Vec<String> {
        self.connectors.read().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ConnectorHost for MemoryConnectorHost {
    async fn create_connection(
        &self,
        catalog: &str,
        connector_name: &str,
        properties: &BTreeMap<String, String>,
    ) -> Result<()> {
        if self.rejected_factories.contains(connector_name) {
            return Err(CatalogError::HostRejection {
                catalog: catalog.to_string(),
                message: format!("no factory for connector {connector_name:?}"),
            });
        }
        self.connectors.write().unwrap().insert(
            catalog.to_string(),
            MemoryConnector {
                connector_name: connector_name.to_string(),
                properties: properties.clone(),
            },
        );
        Ok(())
    }

    async fn drop_connection(&self, catalog: &str) {
        self.connectors.write().unwrap().remove(catalog);
    }

    async fn is_loaded(&self, catalog: &str) -> bool {
        self.connectors.read().unwrap().contains_key(catalog)
    }
}

/// In-memory [`AnnouncementSink`] recording the announced set.
#[derive(Debug, Default)]
pub struct MemoryAnnouncementSink {
    announced: RwLock<BTreeSet<String>>,
}

impl MemoryAnnouncementSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true iff `catalog` is currently announced.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn contains(&self, catalog: &str) -> bool {
        self.announced.read().unwrap().contains(catalog)
    }

    /// The announced catalog set, sorted.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn announced(&self) -> Vec<String> {
        self.announced.read().unwrap().iter().cloned().collect()
    }
}

#[async_trait]
impl AnnouncementSink for MemoryAnnouncementSink {
    async fn add(&self, catalog: &str) {
        self.announced.write().unwrap().insert(catalog.to_string());
    }

    async fn remove(&self, catalog: &str) {
        self.announced.write().unwrap().remove(catalog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_host_create_is_idempotent_replace() {
        let host = MemoryConnectorHost::new();
        let mut props = BTreeMap::new();
        props.insert("connection-url".to_string(), "a".to_string());
        host.create_connection("c1", "mysql", &props).await.unwrap();

        props.insert("connection-url".to_string(), "b".to_string());
        host.create_connection("c1", "mysql", &props).await.unwrap();

        let connector = host.connector("c1").unwrap();
        assert_eq!(
            connector.properties.get("connection-url").map(String::as_str),
            Some("b")
        );
        assert_eq!(host.loaded_catalogs(), vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn memory_host_rejects_configured_factory() {
        let host = MemoryConnectorHost::new().with_rejected_factory("broken");
        let err = host
            .create_connection("c1", "broken", &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::HostRejection { .. }));
        assert!(!host.is_loaded("c1").await);
    }

    #[tokio::test]
    async fn memory_sink_add_remove_is_idempotent() {
        let sink = MemoryAnnouncementSink::new();
        sink.add("c1").await;
        sink.add("c1").await;
        assert!(sink.contains("c1"));
        sink.remove("c1").await;
        sink.remove("c1").await;
        assert!(!sink.contains("c1"));
    }
}
