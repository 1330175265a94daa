//! Order Columns - meta filters on a denormalized order table
//!
//! Query producers keep filtering orders by meta key and value; this crate
//! rewrites the queries they assemble so those filters read typed columns of
//! the order table instead of the generic key/value side table:
//! - Attribute key ↔ column mapping
//! - Meta query classification (mapped vs. pass-through)
//! - JOIN/WHERE rewriting for listing queries
//! - Multi-alias rewriting for report queries
//! - Address index backfill

pub mod utils;

pub mod column_map;
pub mod config;
pub mod index_maintenance;
pub mod meta_query;
pub mod query_rewrite;

pub use column_map::AttributeColumnMap;
pub use config::{RewriteConfig, UpdateDialect};
pub use index_maintenance::{IndexMaintainer, StatementExecutor};
pub use meta_query::{MetaPredicate, MetaPredicateNormalizer, MetaQuery};
pub use query_rewrite::{OrderQueryFilters, QueryContext, ReportQuery};
