use thiserror::Error;

use crate::column_map::ColumnMapError;

/// Failures while setting up the rewriters. Rewriting itself never fails.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Failed to compile rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Attribute mapping error: {0}")]
    ColumnMap(#[from] ColumnMapError),
}
