//! Router assembly and serve loop.

use std::net::SocketAddr;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ReadyResponse {
    /// True once the initial bulk catalog load has finished.
    pub ready: bool,
}

/// Builds the full application router: admin endpoints nested under
/// `mount_prefix`, plus `/health` and `/ready`.
///
/// # Panics
///
/// Panics if `mount_prefix` is `"/"` or does not start with `/`.
/// [`crate::config::Config::from_env`] produces a prefix that satisfies
/// this.
pub fn app_router(state: AppState, mount_prefix: &str) -> Router {
    assert!(
        mount_prefix.starts_with('/') && mount_prefix != "/",
        "mount_prefix must start with '/' and must not be '/'"
    );
    Router::new()
        .nest(mount_prefix, routes::routes())
        .route("/health", get(health))
        .route("/ready", get(ready))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        ready: state.reconciler.catalogs_loaded(),
    })
}

/// Binds `port` on all interfaces and serves the router until the process
/// exits.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(state: AppState, mount_prefix: &str, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, prefix = mount_prefix, "catalog manager listening");
    axum::serve(listener, app_router(state, mount_prefix)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use catman_core::{
        AnnouncementSink, CatalogStore, ConnectorHost, MemoryAnnouncementSink,
        MemoryConnectorHost, Reconciler,
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(dir: &TempDir) -> AppState {
        let store = CatalogStore::new(dir.path());
        let host: Arc<dyn ConnectorHost> = Arc::new(MemoryConnectorHost::new());
        let sink: Arc<dyn AnnouncementSink> = Arc::new(MemoryAnnouncementSink::new());
        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            Arc::clone(&host),
            sink,
        ));
        AppState::new(store, host, reconciler)
    }

    #[tokio::test]
    #[should_panic(expected = "mount_prefix")]
    async fn app_router_rejects_root_prefix() {
        let dir = TempDir::new().unwrap();
        let _ = app_router(test_state(&dir), "/");
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let dir = TempDir::new().unwrap();
        let app = app_router(test_state(&dir), "/catalog/api");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_reflects_load_latch() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let reconciler = Arc::clone(&state.reconciler);
        let app = app_router(state, "/catalog/api");

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let ready: ReadyResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!ready.ready);

        Arc::clone(&reconciler).load_all(&BTreeMap::new()).await;

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let ready: ReadyResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(ready.ready);
    }
}
