//! Server configuration, loaded from environment variables.

use std::path::PathBuf;

/// Result alias for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable was present but invalid.
    #[error("{0}")]
    Invalid(String),
}

/// Configuration for the catalog manager server.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub http_port: u16,

    /// Directory containing `<name>.properties` catalog files.
    pub catalog_dir: PathBuf,

    /// Catalog names that are never loaded into the host engine.
    pub disabled_catalogs: Vec<String>,

    /// Mount prefix for the admin endpoints (must start with `/`).
    pub mount_prefix: String,

    /// Enable debug mode (pretty logs instead of JSON).
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            catalog_dir: PathBuf::from("etc/catalog"),
            disabled_catalogs: Vec::new(),
            mount_prefix: default_mount_prefix(),
            debug: false,
        }
    }
}

fn default_mount_prefix() -> String {
    "/catalog/api".to_string()
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Supported env vars:
    /// - `CATMAN_HTTP_PORT`
    /// - `CATMAN_CATALOG_DIR`
    /// - `CATMAN_DISABLED_CATALOGS` (comma-separated catalog names)
    /// - `CATMAN_MOUNT_PREFIX`
    /// - `CATMAN_DEBUG`
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed, or
    /// if the mount prefix is invalid.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = env_u16("CATMAN_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(dir) = env_string("CATMAN_CATALOG_DIR") {
            config.catalog_dir = PathBuf::from(dir);
        }
        if let Some(disabled) = env_string("CATMAN_DISABLED_CATALOGS") {
            config.disabled_catalogs = parse_disabled_catalogs(&disabled);
        }
        if let Some(prefix) = env_string("CATMAN_MOUNT_PREFIX") {
            config.mount_prefix = prefix;
        }
        if let Some(debug) = env_bool("CATMAN_DEBUG")? {
            config.debug = debug;
        }

        if !config.mount_prefix.starts_with('/') {
            return Err(ConfigError::Invalid(
                "CATMAN_MOUNT_PREFIX must start with '/'".to_string(),
            ));
        }
        if config.mount_prefix.ends_with('/') {
            config.mount_prefix = config.mount_prefix.trim_end_matches('/').to_string();
        }
        if config.mount_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "CATMAN_MOUNT_PREFIX cannot be '/' (would shadow /health and /ready)".to_string(),
            ));
        }

        Ok(config)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u16(name: &str) -> Result<Option<u16>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u16>()
        .map(Some)
        .map_err(|e| ConfigError::Invalid(format!("{name} must be a u16: {e}")))
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    match v.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(Some(true)),
        "false" | "0" | "no" | "n" => Ok(Some(false)),
        _ => Err(ConfigError::Invalid(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

fn parse_disabled_catalogs(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.mount_prefix, "/catalog/api");
        assert!(config.disabled_catalogs.is_empty());
        assert!(!config.debug);
    }

    #[test]
    fn parse_disabled_catalogs_splits_and_trims() {
        assert_eq!(
            parse_disabled_catalogs("a, b ,,c"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(parse_disabled_catalogs("  ").is_empty());
    }
}
