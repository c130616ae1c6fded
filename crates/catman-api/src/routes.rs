//! Admin endpoints for catalog mutations and queries.
//!
//! All endpoints are `POST`, take a JSON object with a mandatory
//! `catalogName` field, and answer HTTP 200 with the outcome carried as an
//! integer body: `0` success, `-1` error, `-2` file-only (for `/catalog`).
//! This is the documented wire contract.
//!
//! Mutations go through the on-disk store only. The reconciler picks them
//! up via the directory watcher, so a successful `/add` becomes visible to
//! `/conf` after a short delay.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tracing::{info, warn};

use catman_core::{CatalogDefinition, CatalogName};

use crate::state::AppState;

/// Operation succeeded.
pub const SUCCESS: i32 = 0;
/// Operation failed.
pub const ERROR: i32 = -1;
/// The catalog file exists but no connector is loaded.
pub const FILE_ONLY: i32 = -2;

/// Admin route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_catalog))
        .route("/delete", post(delete_catalog))
        .route("/update", post(update_catalog))
        .route("/conf", post(catalog_is_loaded))
        .route("/file", post(catalog_file_exists))
        .route("/catalog", post(catalog_status))
}

/// Extracts and validates `catalogName` from a request body.
fn catalog_name(body: &Value) -> Option<CatalogName> {
    let name = body.get("catalogName")?.as_str()?;
    match CatalogName::new(name) {
        Ok(name) => Some(name),
        Err(error) => {
            warn!(%error, "rejecting request with invalid catalog name");
            None
        }
    }
}

/// Builds a definition from every body field except `catalogName`.
///
/// All property values must be JSON strings.
fn definition_from_body(body: &Value) -> Option<CatalogDefinition> {
    let object = body.as_object()?;
    let mut definition = CatalogDefinition::new();
    for (key, value) in object {
        if key == "catalogName" {
            continue;
        }
        let value = value.as_str()?;
        definition.insert(key.clone(), value);
    }
    Some(definition)
}

/// `POST /add` — create the catalog file.
async fn add_catalog(State(state): State<AppState>, Json(body): Json<Value>) -> Json<i32> {
    let Some(name) = catalog_name(&body) else {
        return Json(ERROR);
    };
    let Some(definition) = definition_from_body(&body) else {
        warn!(catalog = %name, "add request has non-string property values");
        return Json(ERROR);
    };
    match state.store.write_new(&name, &definition) {
        Ok(()) => {
            info!(catalog = %name, "catalog file created via admin api");
            Json(SUCCESS)
        }
        Err(error) => {
            warn!(catalog = %name, %error, "admin add failed");
            Json(ERROR)
        }
    }
}

/// `POST /delete` — remove the catalog file.
async fn delete_catalog(State(state): State<AppState>, Json(body): Json<Value>) -> Json<i32> {
    let Some(name) = catalog_name(&body) else {
        return Json(ERROR);
    };
    match state.store.remove(&name) {
        Ok(()) => {
            info!(catalog = %name, "catalog file removed via admin api");
            Json(SUCCESS)
        }
        Err(error) => {
            warn!(catalog = %name, %error, "admin delete failed");
            Json(ERROR)
        }
    }
}

/// `POST /update` — remove the catalog file, then recreate it from the
/// request body.
///
/// Not atomic: a crash between the two steps leaves the catalog absent and
/// the operator retries.
async fn update_catalog(State(state): State<AppState>, Json(body): Json<Value>) -> Json<i32> {
    let Some(name) = catalog_name(&body) else {
        return Json(ERROR);
    };
    let Some(definition) = definition_from_body(&body) else {
        warn!(catalog = %name, "update request has non-string property values");
        return Json(ERROR);
    };
    if let Err(error) = state.store.remove(&name) {
        warn!(catalog = %name, %error, "admin update failed to remove old file");
        return Json(ERROR);
    }
    match state.store.write_new(&name, &definition) {
        Ok(()) => {
            info!(catalog = %name, "catalog file replaced via admin api");
            Json(SUCCESS)
        }
        Err(error) => {
            warn!(catalog = %name, %error, "admin update failed to write new file");
            Json(ERROR)
        }
    }
}

/// `POST /conf` — `0` iff a connector is loaded for the catalog.
async fn catalog_is_loaded(State(state): State<AppState>, Json(body): Json<Value>) -> Json<i32> {
    let Some(name) = catalog_name(&body) else {
        return Json(ERROR);
    };
    if state.host.is_loaded(name.as_str()).await {
        Json(SUCCESS)
    } else {
        Json(ERROR)
    }
}

/// `POST /file` — `0` iff the catalog file exists on disk.
async fn catalog_file_exists(State(state): State<AppState>, Json(body): Json<Value>) -> Json<i32> {
    let Some(name) = catalog_name(&body) else {
        return Json(ERROR);
    };
    if state.store.exists(&name) {
        Json(SUCCESS)
    } else {
        Json(ERROR)
    }
}

/// `POST /catalog` — `0` if loaded, `-2` if only the file exists, `-1` if
/// neither.
async fn catalog_status(State(state): State<AppState>, Json(body): Json<Value>) -> Json<i32> {
    let Some(name) = catalog_name(&body) else {
        return Json(ERROR);
    };
    if state.host.is_loaded(name.as_str()).await {
        Json(SUCCESS)
    } else if state.store.exists(&name) {
        Json(FILE_ONLY)
    } else {
        Json(ERROR)
    }
}
