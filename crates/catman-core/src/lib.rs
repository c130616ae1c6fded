//! # catman-core
//!
//! Dynamic catalog manager for a federated SQL query engine.
//!
//! A catalog is a named, file-backed connector configuration
//! (`<dir>/<name>.properties`) that the embedding query engine mounts at
//! runtime. This crate keeps three views consistent:
//!
//! - the catalog definition files on disk,
//! - the connectors instantiated inside the host engine, and
//! - the datasource announcement the host publishes to the cluster.
//!
//! ## Components
//!
//! - [`properties`]: the `key=value` catalog file codec
//! - [`store`]: atomic create/delete of catalog files (staged `.bak`,
//!   promoted only when complete)
//! - [`watcher`]: filesystem change events for the catalog directory
//! - [`reconciler`]: the one-shot bulk load and the steady-state event loop
//! - [`host`]: the [`host::ConnectorHost`] / [`host::AnnouncementSink`]
//!   seams to the embedding engine
//!
//! Admin-driven mutations (see the `catman-api` crate) and direct operator
//! edits both land on disk; the watcher and reconciler are the single code
//! path that propagates either to the live engine.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]

pub mod error;
pub mod host;
pub mod name;
pub mod observability;
pub mod properties;
pub mod reconciler;
pub mod store;
pub mod watcher;

pub use error::{CatalogError, Result};
pub use host::{AnnouncementSink, ConnectorHost, MemoryAnnouncementSink, MemoryConnectorHost};
pub use name::CatalogName;
pub use properties::{CatalogDefinition, CONNECTOR_NAME_KEY};
pub use reconciler::Reconciler;
pub use store::CatalogStore;
pub use watcher::{CatalogEvent, CatalogEventKind, CatalogWatcher};
