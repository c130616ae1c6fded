//! # catman-api
//!
//! Remote-administration surface for the catman catalog manager.
//!
//! Six `POST` endpoints mounted under a configurable prefix (default
//! `/catalog/api`): `/add`, `/delete`, `/update` mutate catalog files on
//! disk; `/conf`, `/file`, `/catalog` query connector liveness and file
//! presence. Mutations never touch the reconciler directly — the directory
//! watcher is the single propagation path, so admin-driven and
//! operator-driven edits share one code path.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]

pub mod config;
pub mod routes;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::{app_router, serve};
pub use state::AppState;
