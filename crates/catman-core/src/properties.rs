//! Catalog definition files: the `key=value` properties codec.
//!
//! One property per `\n`-terminated line, first `=` is the separator. There
//! is no comment syntax and no escaping; keys containing `=` or newlines and
//! values containing newlines are rejected at serialization time.

use std::collections::BTreeMap;

use crate::error::{CatalogError, Result};

/// The property that selects the host-engine connector factory.
pub const CONNECTOR_NAME_KEY: &str = "connector.name";

/// A catalog definition: property names mapped to property values.
///
/// Backed by a `BTreeMap`, so serialization order is stable for a given
/// input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDefinition {
    properties: BTreeMap<String, String>,
}

impl CatalogDefinition {
    /// Creates an empty definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Returns true when the definition has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Iterates over `(key, value)` pairs in stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses a properties file body.
    ///
    /// Empty lines are ignored. Each remaining line is split on the first
    /// `=`; neither side is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MalformedCatalog`] for a non-empty line
    /// without `=` or a line with an empty key.
    pub fn parse(body: &str) -> Result<Self> {
        let mut properties = BTreeMap::new();
        for line in body.split('\n') {
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(CatalogError::MalformedCatalog {
                    message: format!("line {line:?} has no '=' separator"),
                });
            };
            if key.is_empty() {
                return Err(CatalogError::MalformedCatalog {
                    message: format!("line {line:?} has an empty key"),
                });
            }
            properties.insert(key.to_string(), value.to_string());
        }
        Ok(Self { properties })
    }

    /// Serializes the definition as a `\n`-joined properties body.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MalformedCatalog`] for keys containing `=`
    /// or a newline, empty keys, or values containing a newline.
    pub fn serialize(&self) -> Result<String> {
        let mut lines = Vec::with_capacity(self.properties.len());
        for (key, value) in &self.properties {
            if key.is_empty() {
                return Err(CatalogError::MalformedCatalog {
                    message: "property key is empty".to_string(),
                });
            }
            if key.contains('=') || key.contains('\n') {
                return Err(CatalogError::MalformedCatalog {
                    message: format!("property key {key:?} contains '=' or newline"),
                });
            }
            if value.contains('\n') {
                return Err(CatalogError::MalformedCatalog {
                    message: format!("value for {key:?} contains a newline"),
                });
            }
            lines.push(format!("{key}={value}"));
        }
        Ok(lines.join("\n"))
    }

    /// Splits the definition into the connector factory name and the
    /// remaining connector properties.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingConnectorName`] when the
    /// `connector.name` property is absent.
    pub fn split_connector(&self, catalog: &str) -> Result<(String, BTreeMap<String, String>)> {
        let mut connector_name = None;
        let mut connector_properties = BTreeMap::new();
        for (key, value) in &self.properties {
            if key == CONNECTOR_NAME_KEY {
                connector_name = Some(value.clone());
            } else {
                connector_properties.insert(key.clone(), value.clone());
            }
        }
        let connector_name = connector_name.ok_or_else(|| CatalogError::MissingConnectorName {
            catalog: catalog.to_string(),
        })?;
        Ok((connector_name, connector_properties))
    }
}

impl FromIterator<(String, String)> for CatalogDefinition {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}
