//! The reconciliation engine.
//!
//! Converges three views of the catalog set: definition files on disk, the
//! connectors instantiated inside the host engine, and the datasource
//! announcement published to the cluster. A one-shot latch pair guards the
//! initial bulk load; afterwards a single event-loop task applies
//! watcher-delivered changes in arrival order.
//!
//! Every `apply_*` operation is idempotent and memoryless. Admin-driven
//! mutations write through the filesystem and come back as watcher events,
//! so the reconciler re-processes its own writes without harm.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::host::{AnnouncementSink, ConnectorHost};
use crate::name::CatalogName;
use crate::properties::CatalogDefinition;
use crate::store::CatalogStore;
use crate::watcher::{CatalogEvent, CatalogEventKind, CatalogWatcher};

/// Reconciles on-disk catalog definitions with the host engine and the
/// cluster announcement.
pub struct Reconciler {
    store: CatalogStore,
    host: Arc<dyn ConnectorHost>,
    sink: Arc<dyn AnnouncementSink>,
    disabled: BTreeSet<String>,
    loading: AtomicBool,
    loaded: AtomicBool,
    watch_task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("dir", &self.store.dir())
            .field("disabled", &self.disabled)
            .field("loaded", &self.loaded.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a reconciler over `store`, driving `host` and `sink`.
    #[must_use]
    pub fn new(
        store: CatalogStore,
        host: Arc<dyn ConnectorHost>,
        sink: Arc<dyn AnnouncementSink>,
    ) -> Self {
        Self {
            store,
            host,
            sink,
            disabled: BTreeSet::new(),
            loading: AtomicBool::new(false),
            loaded: AtomicBool::new(false),
            watch_task: Mutex::new(None),
        }
    }

    /// Configures the set of catalog names that are never loaded.
    ///
    /// Immutable after construction.
    #[must_use]
    pub fn with_disabled_catalogs<I, S>(mut self, disabled: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled = disabled.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true once the initial bulk load has finished.
    #[must_use]
    pub fn catalogs_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// The store this reconciler observes.
    #[must_use]
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Runs the initial bulk load, then starts the directory watcher and
    /// the steady-state event loop on an owned task.
    ///
    /// Runs at most once per process lifetime: a concurrent or repeated
    /// call returns immediately without error. Per-catalog parse or apply
    /// failures are logged and skipped; the load as a whole always
    /// succeeds. Entries in `extra` are applied in-memory only, without a
    /// disk write.
    pub async fn load_all(
        self: Arc<Self>,
        extra: &BTreeMap<CatalogName, CatalogDefinition>,
    ) {
        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        match self.store.list() {
            Ok(names) => {
                for name in names {
                    info!(catalog = %name, "loading catalog properties");
                    match self.store.read(&name) {
                        Ok(definition) => {
                            if let Err(error) = self.apply_create(&name, &definition).await {
                                warn!(catalog = %name, %error, "skipping catalog that failed to load");
                            }
                        }
                        Err(error) => {
                            warn!(catalog = %name, %error, "skipping unreadable catalog file");
                        }
                    }
                }
            }
            Err(error) => {
                error!(dir = %self.store.dir().display(), %error, "cannot enumerate catalog directory");
            }
        }

        for (name, definition) in extra {
            if let Err(error) = self.apply_create(name, definition).await {
                warn!(catalog = %name, %error, "skipping additional catalog that failed to load");
            }
        }

        self.loaded.store(true, Ordering::SeqCst);
        info!(dir = %self.store.dir().display(), "initial catalog load complete");

        match CatalogWatcher::start(self.store.dir()) {
            Ok(watcher) => {
                info!(dir = %self.store.dir().display(), "catalog watcher started");
                // The task holds only a weak handle so it never keeps the
                // reconciler alive; Drop can then reach the abort.
                let weak = Arc::downgrade(&self);
                let task = tokio::spawn(async move {
                    Self::drive_watch(weak, watcher).await;
                });
                *self.watch_task.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
                    Some(task);
            }
            Err(error) => {
                error!(%error, "catalog watcher failed to start; dynamic updates disabled");
            }
        }
    }

    /// Consumes events from `watcher` until its stream ends.
    ///
    /// Public so embedders and tests can drive the loop with their own
    /// watcher instance.
    pub async fn run_event_loop(&self, mut watcher: CatalogWatcher) {
        info!(dir = %self.store.dir().display(), "catalog watcher started");
        while let Some(event) = watcher.next_event().await {
            self.apply_event(&event).await;
        }
        warn!("catalog watch ended; live catalog updates are disabled until restart");
    }

    async fn drive_watch(this: Weak<Self>, mut watcher: CatalogWatcher) {
        while let Some(event) = watcher.next_event().await {
            let Some(reconciler) = this.upgrade() else {
                return;
            };
            reconciler.apply_event(&event).await;
        }
        warn!("catalog watch ended; live catalog updates are disabled until restart");
    }

    /// Applies one observed file-level change.
    pub async fn apply_event(&self, event: &CatalogEvent) {
        let name = &event.name;
        match event.kind {
            CatalogEventKind::Created => {
                info!(catalog = %name, "catalog file created");
                self.create_from_file(name).await;
            }
            CatalogEventKind::Modified => {
                info!(catalog = %name, "catalog file modified");
                self.apply_delete(name).await;
                // A parse failure on reload leaves the connector dropped.
                self.create_from_file(name).await;
            }
            CatalogEventKind::Deleted => {
                info!(catalog = %name, "catalog file deleted");
                self.apply_delete(name).await;
            }
        }
    }

    async fn create_from_file(&self, name: &CatalogName) {
        match self.store.read(name) {
            Ok(definition) => {
                if let Err(error) = self.apply_create(name, &definition).await {
                    warn!(catalog = %name, %error, "catalog not loaded");
                }
            }
            Err(error) => {
                warn!(catalog = %name, %error, "catalog file unreadable; not loaded");
            }
        }
    }

    /// Registers the connector for `name` with the host, then announces it.
    ///
    /// A name in the disabled set is skipped. A host rejection prevents the
    /// announcement and leaves the catalog absent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CatalogError::MissingConnectorName`] or the
    /// host's rejection.
    pub async fn apply_create(
        &self,
        name: &CatalogName,
        definition: &CatalogDefinition,
    ) -> Result<()> {
        if self.disabled.contains(name.as_str()) {
            info!(catalog = %name, "skipping disabled catalog");
            return Ok(());
        }

        let (connector_name, connector_properties) = definition.split_connector(name.as_str())?;
        self.host
            .create_connection(name.as_str(), &connector_name, &connector_properties)
            .await?;
        self.sink.add(name.as_str()).await;
        info!(catalog = %name, connector = %connector_name, "catalog loaded");
        Ok(())
    }

    /// Drops the connector for `name` and withdraws its announcement.
    ///
    /// Idempotent: unknown names are a no-op.
    pub async fn apply_delete(&self, name: &CatalogName) {
        if !self.host.is_loaded(name.as_str()).await {
            info!(catalog = %name, "removing catalog that is not loaded; no-op");
        } else {
            info!(catalog = %name, "removing catalog");
        }
        self.host.drop_connection(name.as_str()).await;
        self.sink.remove(name.as_str()).await;
    }
}

impl Drop for Reconciler {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.watch_task.lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryAnnouncementSink, MemoryConnectorHost};
    use tempfile::TempDir;

    fn name(s: &str) -> CatalogName {
        CatalogName::new(s).unwrap()
    }

    fn mysql_definition() -> CatalogDefinition {
        let mut def = CatalogDefinition::new();
        def.insert("connector.name", "mysql");
        def.insert("connection-url", "jdbc:mysql://h:3306");
        def
    }

    struct Fixture {
        _dir: TempDir,
        host: Arc<MemoryConnectorHost>,
        sink: Arc<MemoryAnnouncementSink>,
        reconciler: Arc<Reconciler>,
    }

    fn fixture_with(host: MemoryConnectorHost, disabled: &[&str]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let host = Arc::new(host);
        let sink = Arc::new(MemoryAnnouncementSink::new());
        let reconciler = Arc::new(
            Reconciler::new(
                CatalogStore::new(dir.path()),
                Arc::clone(&host) as Arc<dyn ConnectorHost>,
                Arc::clone(&sink) as Arc<dyn AnnouncementSink>,
            )
            .with_disabled_catalogs(disabled.iter().copied()),
        );
        Fixture {
            _dir: dir,
            host,
            sink,
            reconciler,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MemoryConnectorHost::new(), &[])
    }

    #[tokio::test]
    async fn apply_create_registers_and_announces() {
        let f = fixture();
        f.reconciler
            .apply_create(&name("mysql1"), &mysql_definition())
            .await
            .unwrap();

        assert!(f.host.is_loaded("mysql1").await);
        assert!(f.sink.contains("mysql1"));
        let connector = f.host.connector("mysql1").unwrap();
        assert_eq!(connector.connector_name, "mysql");
        // connector.name itself is not passed through as a property
        assert!(!connector.properties.contains_key("connector.name"));
    }

    #[tokio::test]
    async fn apply_create_failure_prevents_announcement() {
        let f = fixture_with(MemoryConnectorHost::new().with_rejected_factory("mysql"), &[]);
        let err = f
            .reconciler
            .apply_create(&name("mysql1"), &mysql_definition())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CatalogError::HostRejection { .. }
        ));
        assert!(!f.host.is_loaded("mysql1").await);
        assert!(!f.sink.contains("mysql1"));
    }

    #[tokio::test]
    async fn apply_create_requires_connector_name() {
        let f = fixture();
        let mut def = CatalogDefinition::new();
        def.insert("connection-url", "x");
        let err = f.reconciler.apply_create(&name("p1"), &def).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::CatalogError::MissingConnectorName { .. }
        ));
        assert!(!f.host.is_loaded("p1").await);
    }

    #[tokio::test]
    async fn disabled_catalog_is_never_created_or_announced() {
        let f = fixture_with(MemoryConnectorHost::new(), &["blocked"]);
        f.reconciler
            .apply_create(&name("blocked"), &mysql_definition())
            .await
            .unwrap();
        assert!(!f.host.is_loaded("blocked").await);
        assert!(!f.sink.contains("blocked"));
    }

    #[tokio::test]
    async fn apply_delete_reaches_host_and_sink() {
        let f = fixture();
        f.reconciler
            .apply_create(&name("mysql1"), &mysql_definition())
            .await
            .unwrap();
        f.reconciler.apply_delete(&name("mysql1")).await;
        assert!(!f.host.is_loaded("mysql1").await);
        assert!(!f.sink.contains("mysql1"));
    }

    #[tokio::test]
    async fn apply_delete_unknown_name_is_noop() {
        let f = fixture();
        f.reconciler.apply_delete(&name("ghost")).await;
        assert!(f.host.loaded_catalogs().is_empty());
        assert!(f.sink.announced().is_empty());
    }

    #[tokio::test]
    async fn load_all_runs_once() {
        let f = fixture();
        f.reconciler
            .store()
            .write_new(&name("mysql1"), &mysql_definition())
            .unwrap();

        let extra = BTreeMap::new();
        Arc::clone(&f.reconciler).load_all(&extra).await;
        assert!(f.reconciler.catalogs_loaded());
        assert!(f.host.is_loaded("mysql1").await);

        // Second invocation is a guarded no-op.
        f.host.drop_connection("mysql1").await;
        Arc::clone(&f.reconciler).load_all(&extra).await;
        assert!(!f.host.is_loaded("mysql1").await);
    }

    #[tokio::test]
    async fn dropping_reconciler_releases_it_despite_watch_task() {
        let f = fixture();
        Arc::clone(&f.reconciler).load_all(&BTreeMap::new()).await;

        let weak = Arc::downgrade(&f.reconciler);
        drop(f);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn load_all_applies_extra_without_disk_write() {
        let f = fixture();
        let mut extra = BTreeMap::new();
        extra.insert(name("embedded"), mysql_definition());
        Arc::clone(&f.reconciler).load_all(&extra).await;

        assert!(f.host.is_loaded("embedded").await);
        assert!(f.sink.contains("embedded"));
        assert!(!f.reconciler.store().exists(&name("embedded")));
    }
}
