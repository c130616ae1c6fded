//! Error types for catalog manager operations.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while managing catalogs.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog file body could not be parsed or serialized.
    #[error("malformed catalog: {message}")]
    MalformedCatalog {
        /// Description of the offending line or property.
        message: String,
    },

    /// A catalog definition lacks the mandatory `connector.name` property.
    #[error("catalog {catalog} does not contain connector.name")]
    MissingConnectorName {
        /// The catalog the definition was meant for.
        catalog: String,
    },

    /// A catalog name is not a valid identifier.
    #[error("invalid catalog name {name:?}: {message}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        message: String,
    },

    /// A catalog file already exists on disk.
    #[error("catalog {catalog} already exists")]
    AlreadyExists {
        /// The catalog whose file was found.
        catalog: String,
    },

    /// A catalog file was not found on disk.
    #[error("catalog {catalog} not found")]
    NotFound {
        /// The catalog whose file was missing.
        catalog: String,
    },

    /// Disk I/O failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// Path the operation was acting on.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The host engine refused to instantiate or drop a connector.
    #[error("connector host rejected {catalog}: {message}")]
    HostRejection {
        /// The catalog being applied.
        catalog: String,
        /// Host-provided reason.
        message: String,
    },

    /// The directory watch handle became invalid.
    #[error("watch invalidated: {message}")]
    WatchInvalidated {
        /// Description from the notification backend.
        message: String,
    },
}
