//! `catman` binary entrypoint.
//!
//! Loads configuration from environment variables, runs the initial catalog
//! load, and starts the admin HTTP server. Without an embedding query
//! engine the in-memory connector host and announcement sink are used, so
//! the manager can run standalone for development and testing.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use catman_api::config::Config;
use catman_api::state::AppState;
use catman_core::observability::{init_logging, LogFormat};
use catman_core::{
    AnnouncementSink, CatalogStore, ConnectorHost, MemoryAnnouncementSink, MemoryConnectorHost,
    Reconciler,
};

fn choose_log_format(config: &Config) -> LogFormat {
    if config.debug {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(choose_log_format(&config));

    std::fs::create_dir_all(&config.catalog_dir).with_context(|| {
        format!(
            "cannot create catalog directory {}",
            config.catalog_dir.display()
        )
    })?;

    tracing::warn!("no embedded query engine; using in-memory connector host");
    let host: Arc<dyn ConnectorHost> = Arc::new(MemoryConnectorHost::new());
    let sink: Arc<dyn AnnouncementSink> = Arc::new(MemoryAnnouncementSink::new());

    let store = CatalogStore::new(&config.catalog_dir);
    let reconciler = Arc::new(
        Reconciler::new(store.clone(), Arc::clone(&host), sink)
            .with_disabled_catalogs(config.disabled_catalogs.iter().cloned()),
    );
    Arc::clone(&reconciler).load_all(&BTreeMap::new()).await;

    let state = AppState::new(store, host, Arc::clone(&reconciler));
    catman_api::serve(state, &config.mount_prefix, config.http_port)
        .await
        .context("admin server failed")?;
    Ok(())
}
