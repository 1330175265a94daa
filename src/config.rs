use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::utils::is_sql_identifier;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Statement shape used for index backfill updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateDialect {
    /// `UPDATE t SET c = CONCAT_WS(...) WHERE ...`
    #[default]
    Standard,
    /// `ALTER TABLE t UPDATE c = ... WHERE ...` (ClickHouse mutation)
    ClickHouse,
}

#[derive(Error, Debug)]
#[error("unknown update dialect `{0}` (expected `standard` or `clickhouse`)")]
pub struct UnknownDialect(String);

impl FromStr for UpdateDialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "mysql" => Ok(UpdateDialect::Standard),
            "clickhouse" => Ok(UpdateDialect::ClickHouse),
            other => Err(UnknownDialect(other.to_string())),
        }
    }
}

impl fmt::Display for UpdateDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateDialect::Standard => write!(f, "standard"),
            UpdateDialect::ClickHouse => write!(f, "clickhouse"),
        }
    }
}

/// Table names, aliases and mapping source shared by every rewriter.
///
/// All name fields are spliced into SQL and regex patterns, so they are
/// validated as plain identifiers.
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RewriteConfig {
    /// Generic key/value side table
    #[validate(custom(function = "validate_identifier"))]
    pub side_table: String,

    /// Primary record table the queries select from
    #[validate(custom(function = "validate_identifier"))]
    pub primary_table: String,

    /// Denormalized order table
    #[validate(custom(function = "validate_identifier"))]
    pub order_table: String,

    /// Primary key column of the primary record table
    #[validate(custom(function = "validate_identifier"))]
    pub id_column: String,

    /// Column of the order table that references the primary record
    #[validate(custom(function = "validate_identifier"))]
    pub order_id_column: String,

    /// Alias the report builder gives the primary record table
    #[validate(custom(function = "validate_identifier"))]
    pub report_primary_alias: String,

    /// Column on the primary record table holding the parent record id
    #[validate(custom(function = "validate_identifier"))]
    pub parent_column: String,

    /// Optional YAML attribute mapping; the built-in mapping is used when unset
    pub mapping_file: Option<PathBuf>,

    pub update_dialect: UpdateDialect,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            side_table: "wp_postmeta".to_string(),
            primary_table: "wp_posts".to_string(),
            order_table: "wp_woocommerce_orders".to_string(),
            id_column: "ID".to_string(),
            order_id_column: "order_id".to_string(),
            report_primary_alias: "posts".to_string(),
            parent_column: "post_parent".to_string(),
            mapping_file: None,
            update_dialect: UpdateDialect::Standard,
        }
    }
}

impl RewriteConfig {
    /// Create configuration from `ORDER_COLUMNS_*` environment variables
    /// (a `.env` file is honoured), falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            side_table: env_or("ORDER_COLUMNS_SIDE_TABLE", &defaults.side_table),
            primary_table: env_or("ORDER_COLUMNS_PRIMARY_TABLE", &defaults.primary_table),
            order_table: env_or("ORDER_COLUMNS_ORDER_TABLE", &defaults.order_table),
            id_column: env_or("ORDER_COLUMNS_ID_COLUMN", &defaults.id_column),
            order_id_column: env_or("ORDER_COLUMNS_ORDER_ID_COLUMN", &defaults.order_id_column),
            report_primary_alias: env_or(
                "ORDER_COLUMNS_REPORT_PRIMARY_ALIAS",
                &defaults.report_primary_alias,
            ),
            parent_column: env_or("ORDER_COLUMNS_PARENT_COLUMN", &defaults.parent_column),
            mapping_file: env::var("ORDER_COLUMNS_MAPPING_FILE")
                .ok()
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            update_dialect: parse_env_var("ORDER_COLUMNS_UPDATE_DIALECT", "standard")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from a YAML file; missing fields take defaults.
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content.to_string(),
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if is_sql_identifier(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("sql_identifier");
        err.message = Some(format!("`{}` is not a plain SQL identifier", value).into());
        Err(err)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable with a default value
fn parse_env_var<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
