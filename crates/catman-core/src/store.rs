//! On-disk catalog store: atomic create/delete of catalog files.
//!
//! Writes go through a `.bak` staging sibling and are only promoted to the
//! final path once complete, so an external reader never observes a
//! half-written `.properties` file at its final path.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};
use crate::name::CatalogName;
use crate::properties::CatalogDefinition;

/// File-name suffix for catalog definition files.
pub const CATALOG_SUFFIX: &str = "properties";

/// File-name suffix reserved for staging files.
pub const STAGING_SUFFIX: &str = "bak";

/// File-backed catalog store over a single base directory.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    dir: PathBuf,
}

impl CatalogStore {
    /// Creates a store over `dir`. The directory is not created or checked
    /// here; operations fail with [`CatalogError::Io`] if it is missing.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The base directory containing catalog files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path for a catalog, `<dir>/<name>.properties`.
    #[must_use]
    pub fn catalog_path(&self, name: &CatalogName) -> PathBuf {
        self.dir.join(name.file_name())
    }

    fn staging_path(&self, name: &CatalogName) -> PathBuf {
        self.dir.join(format!("{name}.{STAGING_SUFFIX}"))
    }

    /// Returns true iff the catalog file exists as a regular file.
    #[must_use]
    pub fn exists(&self, name: &CatalogName) -> bool {
        self.catalog_path(name).is_file()
    }

    /// Reads and parses the catalog file for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the file is missing,
    /// [`CatalogError::Io`] on read failure, or
    /// [`CatalogError::MalformedCatalog`] if the body does not parse.
    pub fn read(&self, name: &CatalogName) -> Result<CatalogDefinition> {
        let path = self.catalog_path(name);
        if !path.is_file() {
            return Err(CatalogError::NotFound {
                catalog: name.to_string(),
            });
        }
        let body = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        CatalogDefinition::parse(&body)
    }

    /// Atomically creates the catalog file for `name`.
    ///
    /// The serialized body is written to the `.bak` staging sibling and
    /// flushed to disk, then promoted to the final path without replacement:
    /// the fully-written staging inode is linked at the final name and the
    /// staging entry removed. External readers either see no file or the
    /// complete body, and of two racing writers exactly one wins. On any
    /// failure after staging begins, the staging file is removed best-effort;
    /// the final path is never left partial.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::AlreadyExists`] if the final path already
    /// exists, [`CatalogError::MalformedCatalog`] if the definition cannot
    /// be serialized, or [`CatalogError::Io`] on write or promotion failure.
    pub fn write_new(&self, name: &CatalogName, definition: &CatalogDefinition) -> Result<()> {
        let final_path = self.catalog_path(name);
        if final_path.exists() {
            return Err(CatalogError::AlreadyExists {
                catalog: name.to_string(),
            });
        }
        let body = definition.serialize()?;
        let staging = self.staging_path(name);

        if let Err(source) = self.stage(&staging, &body) {
            let _ = fs::remove_file(&staging);
            return Err(CatalogError::Io {
                path: staging.display().to_string(),
                source,
            });
        }
        // link(2) fails with EEXIST instead of overwriting, so a concurrent
        // writer for the same name loses cleanly.
        if let Err(source) = fs::hard_link(&staging, &final_path) {
            let _ = fs::remove_file(&staging);
            if source.kind() == std::io::ErrorKind::AlreadyExists {
                return Err(CatalogError::AlreadyExists {
                    catalog: name.to_string(),
                });
            }
            return Err(CatalogError::Io {
                path: final_path.display().to_string(),
                source,
            });
        }
        let _ = fs::remove_file(&staging);
        Ok(())
    }

    fn stage(&self, staging: &Path, body: &str) -> std::io::Result<()> {
        let mut file = File::create(staging)?;
        file.write_all(body.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Removes the catalog file for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the file does not exist, or
    /// [`CatalogError::Io`] if the unlink fails.
    pub fn remove(&self, name: &CatalogName) -> Result<()> {
        let path = self.catalog_path(name);
        if !path.is_file() {
            return Err(CatalogError::NotFound {
                catalog: name.to_string(),
            });
        }
        fs::remove_file(&path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Enumerates catalogs present on disk: regular files in the base
    /// directory whose name ends in `.properties`. Subdirectories, hidden
    /// entries, staging files, and other suffixes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the directory cannot be listed.
    pub fn list(&self) -> Result<Vec<CatalogName>> {
        let entries = fs::read_dir(&self.dir).map_err(|source| CatalogError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::Io {
                path: self.dir.display().to_string(),
                source,
            })?;
            if !entry.path().is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let lossy = file_name.to_string_lossy();
            let Some(stem) = catalog_stem(&lossy) else {
                continue;
            };
            match CatalogName::new(stem) {
                Ok(name) => names.push(name),
                Err(error) => {
                    tracing::warn!(file = %lossy, %error, "skipping catalog file with invalid name");
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Returns the catalog name stem for a file name ending in `.properties`,
/// or `None` for any other entry (including `.bak` staging files).
#[must_use]
pub fn catalog_stem(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(".properties")?;
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_definition() -> CatalogDefinition {
        let mut def = CatalogDefinition::new();
        def.insert("connector.name", "mysql");
        def.insert("connection-url", "jdbc:mysql://h:3306");
        def
    }

    fn name(s: &str) -> CatalogName {
        CatalogName::new(s).unwrap()
    }

    #[test]
    fn write_new_creates_readable_file() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path());
        store.write_new(&name("mysql1"), &sample_definition()).unwrap();

        assert!(store.exists(&name("mysql1")));
        assert_eq!(store.read(&name("mysql1")).unwrap(), sample_definition());
    }

    #[test]
    fn write_new_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path());
        store.write_new(&name("mysql1"), &sample_definition()).unwrap();

        assert!(!dir.path().join("mysql1.bak").exists());
    }

    #[test]
    fn write_new_fails_on_existing_catalog() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path());
        store.write_new(&name("dup"), &sample_definition()).unwrap();

        let err = store.write_new(&name("dup"), &sample_definition()).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists { .. }));
    }

    #[test]
    fn write_new_cleans_staging_on_io_failure() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path().join("missing"));

        let err = store.write_new(&name("x"), &sample_definition()).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(!dir.path().join("missing").join("x.properties").exists());
    }

    #[test]
    fn remove_unknown_catalog_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path());
        let err = store.remove(&name("ghost")).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }

    #[test]
    fn remove_deletes_file() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path());
        store.write_new(&name("mysql1"), &sample_definition()).unwrap();
        store.remove(&name("mysql1")).unwrap();
        assert!(!store.exists(&name("mysql1")));
    }

    #[test]
    fn list_ignores_staging_and_foreign_entries() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path());
        store.write_new(&name("a"), &sample_definition()).unwrap();
        store.write_new(&name("b"), &sample_definition()).unwrap();
        std::fs::write(dir.path().join("c.bak"), "connector.name=x").unwrap();
        std::fs::write(dir.path().join("README.md"), "not a catalog").unwrap();
        std::fs::create_dir(dir.path().join("sub.properties")).unwrap();

        let names = store.list().unwrap();
        assert_eq!(names, vec![name("a"), name("b")]);
    }

    #[test]
    fn catalog_stem_filters_suffixes() {
        assert_eq!(catalog_stem("mysql1.properties"), Some("mysql1"));
        assert_eq!(catalog_stem("mysql1.bak"), None);
        assert_eq!(catalog_stem(".properties"), None);
        assert_eq!(catalog_stem(".hidden.properties"), None);
        assert_eq!(catalog_stem("notes.txt"), None);
    }
}
