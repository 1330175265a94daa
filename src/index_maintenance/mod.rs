//! # Address index maintenance
//!
//! The order table carries two precomputed search columns, `billing_index`
//! and `shipping_index`, each a space-joined concatenation of the address
//! fields. Rows written before the indexes existed have them empty; the
//! backfill fills exactly those rows and never touches a populated one, so
//! runs can repeat or overlap without coordination.
//!
//! The company field appears twice in both concatenations. Existing rows were
//! indexed that way, and search results depend on it, so it is kept.

pub mod executor;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::{RewriteConfig, UpdateDialect};

pub use executor::{StatementExecutor, StorageError};

#[derive(Debug, Error)]
pub enum IndexBackfillError {
    #[error("Failed to backfill `{index}`: {source}")]
    Storage {
        index: &'static str,
        #[source]
        source: StorageError,
    },
}

/// A concatenated search column and the ordered columns it is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressIndex {
    pub index_column: &'static str,
    pub source_columns: &'static [&'static str],
}

impl AddressIndex {
    pub const BILLING: AddressIndex = AddressIndex {
        index_column: "billing_index",
        source_columns: &[
            "billing_first_name",
            "billing_last_name",
            "billing_company",
            "billing_company",
            "billing_address_1",
            "billing_address_2",
            "billing_city",
            "billing_state",
            "billing_postcode",
            "billing_country",
            "billing_email",
            "billing_phone",
        ],
    };

    pub const SHIPPING: AddressIndex = AddressIndex {
        index_column: "shipping_index",
        source_columns: &[
            "shipping_first_name",
            "shipping_last_name",
            "shipping_company",
            "shipping_company",
            "shipping_address_1",
            "shipping_address_2",
            "shipping_city",
            "shipping_state",
            "shipping_postcode",
            "shipping_country",
        ],
    };

    /// Backfill order: billing, then shipping.
    pub const ALL: [AddressIndex; 2] = [AddressIndex::BILLING, AddressIndex::SHIPPING];

    /// Index value for `record`, with `CONCAT_WS(' ', ...)` semantics: NULL
    /// columns are skipped, empty strings are kept.
    pub fn compute(&self, record: &OrderRecord) -> String {
        self.source_columns
            .iter()
            .filter_map(|column| record.get(column))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn needs_backfill(&self, record: &OrderRecord) -> bool {
        record.get(self.index_column).is_none_or(str::is_empty)
    }

    /// Fill the index on `record` if it is missing. Returns whether it wrote.
    pub fn backfill(&self, record: &mut OrderRecord) -> bool {
        if !self.needs_backfill(record) {
            return false;
        }
        let value = self.compute(record);
        record.set(self.index_column, Some(value));
        true
    }

    /// The UPDATE that backfills this index for every row missing it.
    pub fn backfill_statement(&self, table: &str, dialect: UpdateDialect) -> String {
        let columns = self.source_columns.join(", ");
        let missing = format!(
            "{index} IS NULL OR {index} = ''",
            index = self.index_column
        );

        match dialect {
            UpdateDialect::Standard => format!(
                "UPDATE {table} SET {index} = CONCAT_WS(' ', {columns}) WHERE {missing}",
                index = self.index_column,
            ),
            UpdateDialect::ClickHouse => format!(
                "ALTER TABLE {table} UPDATE {index} = arrayStringConcat(arrayMap(x -> assumeNotNull(x), \
                 arrayFilter(x -> isNotNull(x), [{columns}])), ' ') WHERE {missing}",
                index = self.index_column,
            ),
        }
    }
}

/// In-memory view of an order table row: nullable text columns by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: u64,
    pub columns: HashMap<String, Option<String>>,
}

impl OrderRecord {
    pub fn new(order_id: u64) -> Self {
        Self {
            order_id,
            columns: HashMap::new(),
        }
    }

    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.set(column, Some(value.into()));
        self
    }

    /// Value of `column`; `None` for NULL or absent columns.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).and_then(|value| value.as_deref())
    }

    pub fn set(&mut self, column: &str, value: Option<String>) {
        self.columns.insert(column.to_string(), value);
    }

    /// Fill whichever address indexes are missing. Returns how many were written.
    pub fn backfill_indexes(&mut self) -> usize {
        let mut written = 0;
        for index in AddressIndex::ALL {
            if index.backfill(self) {
                written += 1;
            }
        }
        written
    }
}

/// Runs the address index backfill against the order table.
pub struct IndexMaintainer<E> {
    executor: E,
    order_table: String,
    dialect: UpdateDialect,
}

impl<E: StatementExecutor> IndexMaintainer<E> {
    pub fn new(executor: E, config: &RewriteConfig) -> Self {
        Self {
            executor,
            order_table: config.order_table.clone(),
            dialect: config.update_dialect,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn statements(&self) -> Vec<String> {
        AddressIndex::ALL
            .iter()
            .map(|index| index.backfill_statement(&self.order_table, self.dialect))
            .collect()
    }

    /// Populate missing billing and shipping indexes. Stops at the first
    /// failing statement.
    pub async fn run_index_backfill(&self) -> Result<(), IndexBackfillError> {
        for index in AddressIndex::ALL {
            let statement = index.backfill_statement(&self.order_table, self.dialect);
            log::info!("Backfilling {} on {}", index.index_column, self.order_table);

            self.executor
                .execute(&statement)
                .await
                .map_err(|source| {
                    log::warn!("Backfill of {} failed: {}", index.index_column, source);
                    IndexBackfillError::Storage {
                        index: index.index_column,
                        source,
                    }
                })?;
        }
        Ok(())
    }
}
