//! # Attribute ↔ column mapping
//!
//! The order table stores well-known meta attributes as first-class columns.
//! [`AttributeColumnMap`] is the single, immutable source of truth for which
//! meta key lives in which column. It is built once (from the built-in table
//! or a YAML file) and then shared read-only, typically behind an `Arc`.
//!
//! Unknown keys are not an error: `column_for` returns `None` and callers fall
//! back to the side table.

pub mod config;
pub mod defaults;
pub mod errors;

use std::collections::HashMap;

use crate::config::RewriteConfig;
use crate::utils::is_sql_identifier;

pub use config::{AttributeDefinition, AttributeMappingConfig};
pub use defaults::DEFAULT_ORDER_ATTRIBUTES;
pub use errors::ColumnMapError;

/// Injective mapping between meta keys and order table columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeColumnMap {
    /// `(key, column)` in definition order
    entries: Vec<(String, String)>,
    by_key: HashMap<String, usize>,
    by_column: HashMap<String, usize>,
}

impl AttributeColumnMap {
    /// Build a map from `(key, column)` pairs, rejecting duplicate keys,
    /// columns shared by two keys, and columns that aren't plain identifiers.
    pub fn from_pairs<I, K, C>(pairs: I) -> Result<Self, ColumnMapError>
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Into<String>,
    {
        let mut map = Self {
            entries: Vec::new(),
            by_key: HashMap::new(),
            by_column: HashMap::new(),
        };

        for (key, column) in pairs {
            let key = key.into();
            let column = column.into();

            if key.is_empty() {
                return Err(ColumnMapError::EmptyKey);
            }
            if !is_sql_identifier(&column) {
                return Err(ColumnMapError::InvalidColumn { key, column });
            }
            if map.by_key.contains_key(&key) {
                return Err(ColumnMapError::DuplicateKey { key });
            }
            if let Some(&existing) = map.by_column.get(&column) {
                return Err(ColumnMapError::DuplicateColumn {
                    column,
                    first_key: map.entries[existing].0.clone(),
                    second_key: key,
                });
            }

            let index = map.entries.len();
            map.by_key.insert(key.clone(), index);
            map.by_column.insert(column.clone(), index);
            map.entries.push((key, column));
        }

        Ok(map)
    }

    /// The built-in order attribute mapping.
    pub fn builtin() -> Self {
        let mut map = Self {
            entries: Vec::with_capacity(DEFAULT_ORDER_ATTRIBUTES.len()),
            by_key: HashMap::with_capacity(DEFAULT_ORDER_ATTRIBUTES.len()),
            by_column: HashMap::with_capacity(DEFAULT_ORDER_ATTRIBUTES.len()),
        };
        for (index, (key, column)) in DEFAULT_ORDER_ATTRIBUTES.iter().enumerate() {
            map.by_key.insert((*key).to_string(), index);
            map.by_column.insert((*column).to_string(), index);
            map.entries.push(((*key).to_string(), (*column).to_string()));
        }
        map
    }

    /// Load the mapping named by the configuration, or the built-in one when
    /// no mapping file is configured.
    pub fn from_config(config: &RewriteConfig) -> Result<Self, ColumnMapError> {
        match &config.mapping_file {
            Some(path) => {
                let map = AttributeMappingConfig::from_yaml_file(path)?.into_column_map()?;
                log::info!(
                    "Loaded {} attribute mappings from {}",
                    map.len(),
                    path.display()
                );
                Ok(map)
            }
            None => {
                log::debug!("Using built-in order attribute mapping");
                Ok(Self::builtin())
            }
        }
    }

    pub fn column_for(&self, key: &str) -> Option<&str> {
        self.by_key
            .get(key)
            .map(|&index| self.entries[index].1.as_str())
    }

    pub fn key_for(&self, column: &str) -> Option<&str> {
        self.by_column
            .get(column)
            .map(|&index| self.entries[index].0.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, column)` pairs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), c.as_str()))
    }
}

impl Default for AttributeColumnMap {
    fn default() -> Self {
        Self::builtin()
    }
}
