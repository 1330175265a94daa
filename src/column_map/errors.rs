//! Errors raised while building an [`AttributeColumnMap`](super::AttributeColumnMap).
//!
//! Lookups never fail; only construction does.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ColumnMapError {
    #[error("Attribute key `{key}` is mapped more than once")]
    DuplicateKey { key: String },
    #[error("Column `{column}` is the target of both `{first_key}` and `{second_key}`")]
    DuplicateColumn {
        column: String,
        first_key: String,
        second_key: String,
    },
    #[error("Attribute key must not be empty")]
    EmptyKey,
    #[error("Column `{column}` for attribute `{key}` is not a valid SQL identifier")]
    InvalidColumn { key: String, column: String },
    #[error("Failed to read attribute mapping file: {error}")]
    ConfigRead { error: String },
    #[error("Failed to parse attribute mapping: {error}")]
    ConfigParse { error: String },
}
