use super::errors::ColumnMapError;
use super::AttributeColumnMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Attribute mappings are defined in YAML:
///
/// ```yaml
/// name: shop_orders          # Optional mapping name
/// attributes:
///   - key: _billing_email    # Meta key as written by the producer
///     column: billing_email  # Column on the order table
///   - key: _order_total
///     column: total
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeMappingConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub attributes: Vec<AttributeDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeDefinition {
    pub key: String,
    pub column: String,
}

impl AttributeMappingConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ColumnMapError> {
        serde_yaml::from_str(yaml).map_err(|e| ColumnMapError::ConfigParse {
            error: e.to_string(),
        })
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ColumnMapError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ColumnMapError::ConfigRead {
            error: format!("{}: {}", path.display(), e),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Validate and freeze the definitions into a lookup map.
    pub fn into_column_map(self) -> Result<AttributeColumnMap, ColumnMapError> {
        AttributeColumnMap::from_pairs(
            self.attributes
                .into_iter()
                .map(|attribute| (attribute.key, attribute.column)),
        )
    }
}
