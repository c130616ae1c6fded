//! Validated catalog names.

use std::fmt;

use crate::error::{CatalogError, Result};

/// A validated catalog name.
///
/// Catalog names double as file stems inside the catalog directory, so the
/// accepted alphabet is restricted to `[A-Za-z0-9_-]+`. This also rules out
/// path separators and hidden-file prefixes at the type level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogName(String);

impl CatalogName {
    /// Parses and validates a catalog name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidName`] if the name is empty or contains
    /// a character outside `[A-Za-z0-9_-]`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CatalogError::InvalidName {
                name,
                message: "name is empty".to_string(),
            });
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(CatalogError::InvalidName {
                name,
                message: format!("character {bad:?} is not in [A-Za-z0-9_-]"),
            });
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the on-disk file name for this catalog (`<name>.properties`).
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, crate::store::CATALOG_SUFFIX)
    }
}

impl fmt::Display for CatalogName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CatalogName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
