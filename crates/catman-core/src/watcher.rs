//! Directory watcher for the catalog configuration directory.
//!
//! Emits one event per changed `.properties` entry, in the order the
//! underlying notification backend delivers them. No coalescing, no
//! debounce: the reconciler is idempotent, so duplicate and split-modify
//! events are harmless. `.bak` staging files are filtered at the source and
//! never reach a consumer.

use std::path::Path;
use std::sync::Mutex;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{CatalogError, Result};
use crate::name::CatalogName;
use crate::store::catalog_stem;

/// What happened to a catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEventKind {
    /// A new `.properties` file appeared.
    Created,
    /// An existing `.properties` file changed (contents or metadata).
    Modified,
    /// A `.properties` file was removed.
    Deleted,
}

/// One observed change to a catalog file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEvent {
    /// What happened.
    pub kind: CatalogEventKind,
    /// The catalog the file belongs to (file stem).
    pub name: CatalogName,
}

impl CatalogEvent {
    /// Convenience constructor.
    #[must_use]
    pub fn new(kind: CatalogEventKind, name: CatalogName) -> Self {
        Self { kind, name }
    }
}

/// A live watch over one catalog directory.
///
/// Dropping the watcher stops the underlying filesystem watch. When the
/// watch handle becomes invalid (for example the directory is deleted), the
/// event stream ends; restarting is the operator's responsibility.
pub struct CatalogWatcher {
    // Held only to keep the kernel watch registered.
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<CatalogEvent>,
}

impl std::fmt::Debug for CatalogWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogWatcher").finish_non_exhaustive()
    }
}

impl CatalogWatcher {
    /// Registers a non-recursive watch on `dir` for create, modify, and
    /// delete notifications.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::WatchInvalidated`] if the watch cannot be
    /// registered.
    pub fn start(dir: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = Mutex::new(Some(tx));
        let watched_dir = dir.to_path_buf();
        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<Event>| {
                let mut guard = sender.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                let Some(tx) = guard.as_ref() else {
                    return;
                };
                match result {
                    Ok(event) => {
                        // Deleting the watched directory itself arrives as an
                        // ordinary Remove event; the kernel watch is gone at
                        // that point, so end the stream.
                        if matches!(event.kind, EventKind::Remove(_))
                            && (event.paths.iter().any(|p| p == &watched_dir)
                                || !watched_dir.exists())
                        {
                            warn!(dir = %watched_dir.display(), "watched catalog directory removed; stopping event stream");
                            *guard = None;
                            return;
                        }
                        for catalog_event in translate(&event) {
                            if tx.send(catalog_event).is_err() {
                                // Consumer is gone; stop forwarding.
                                *guard = None;
                                return;
                            }
                        }
                    }
                    Err(error) => {
                        warn!(%error, "catalog watch invalidated; stopping event stream");
                        // Dropping the sender ends the stream cleanly.
                        *guard = None;
                    }
                }
            })
            .map_err(|error| CatalogError::WatchInvalidated {
                message: error.to_string(),
            })?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|error| CatalogError::WatchInvalidated {
                message: error.to_string(),
            })?;

        Ok(Self {
            _watcher: watcher,
            events: rx,
        })
    }

    /// Waits for the next catalog event. Returns `None` once the watch has
    /// been invalidated and all pending events were drained.
    pub async fn next_event(&mut self) -> Option<CatalogEvent> {
        self.events.recv().await
    }
}

/// Maps a raw notification onto catalog events, one per `.properties` path.
fn translate(event: &Event) -> Vec<CatalogEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => CatalogEventKind::Created,
        EventKind::Modify(_) => CatalogEventKind::Modified,
        EventKind::Remove(_) => CatalogEventKind::Deleted,
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter_map(|path| {
            let file_name = path.file_name()?.to_str()?;
            let stem = catalog_stem(file_name)?;
            let name = CatalogName::new(stem).ok()?;
            Some(CatalogEvent::new(kind, name))
        })
        .collect()
}
