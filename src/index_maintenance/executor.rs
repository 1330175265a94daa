//! Storage seam for index maintenance.
//!
//! The maintainer only needs to run plain update statements; whatever runs
//! them owns consistency and error reporting.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("ClickHouse error: {0}")]
    ClickHouse(#[from] clickhouse::error::Error),

    #[error("Storage error: {0}")]
    Backend(String),
}

/// Executes a single statement against the order table's storage engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn execute(&self, statement: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl StatementExecutor for clickhouse::Client {
    async fn execute(&self, statement: &str) -> Result<(), StorageError> {
        log::debug!("Executing on ClickHouse: {}", statement);
        self.query(statement).execute().await?;
        Ok(())
    }
}
