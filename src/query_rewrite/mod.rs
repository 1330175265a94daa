//! # Query rewriting
//!
//! Moves meta-key filtering from the side table onto order table columns by
//! rewriting the JOIN/WHERE (and, for reports, SELECT) fragments the host's
//! query builder has already assembled.
//!
//! For a listing query the host calls, in order:
//! 1. [`OrderQueryFilters::prepare`] with the meta query, keeping the returned
//!    [`QueryContext`] for the duration of that query;
//! 2. [`OrderQueryFilters::filter_join`] with the finished JOIN clause;
//! 3. [`OrderQueryFilters::filter_where`] with the finished WHERE clause.
//!
//! Steps 2 and 3 apply once per context; repeated calls (nested queries
//! re-entering the host's callbacks) return their input unchanged.
//!
//! Report queries go through [`OrderQueryFilters::filter_report`] on their own.
//!
//! Every rewrite is total: when the expected fragment isn't found the text is
//! returned as it came in.

pub mod errors;
pub mod join_rewriter;
pub mod query_context;
pub mod report_rewriter;
pub mod where_rewriter;

use std::sync::Arc;

use crate::column_map::AttributeColumnMap;
use crate::config::RewriteConfig;
use crate::meta_query::{MetaPredicateNormalizer, MetaQuery};

pub use errors::RewriteError;
pub use join_rewriter::JoinRewriter;
pub use query_context::{QueryContext, RewritePass};
pub use report_rewriter::{JoinAliasMatch, JoinScope, ReportJoinRewriter, ReportQuery, ReportRewrite};
pub use where_rewriter::WhereRewriter;

/// All rewriters for one configuration, sharing a single column map.
#[derive(Debug, Clone)]
pub struct OrderQueryFilters {
    columns: Arc<AttributeColumnMap>,
    normalizer: MetaPredicateNormalizer,
    join_rewriter: JoinRewriter,
    where_rewriter: WhereRewriter,
    report_rewriter: ReportJoinRewriter,
}

impl OrderQueryFilters {
    pub fn new(columns: Arc<AttributeColumnMap>, config: &RewriteConfig) -> Result<Self, RewriteError> {
        Ok(Self {
            normalizer: MetaPredicateNormalizer::new(Arc::clone(&columns)),
            join_rewriter: JoinRewriter::new(config)?,
            where_rewriter: WhereRewriter::new(config),
            report_rewriter: ReportJoinRewriter::new(Arc::clone(&columns), config)?,
            columns,
        })
    }

    /// Build the filters with the mapping the configuration points at.
    pub fn from_config(config: &RewriteConfig) -> Result<Self, RewriteError> {
        let columns = Arc::new(AttributeColumnMap::from_config(config)?);
        Self::new(columns, config)
    }

    pub fn columns(&self) -> &AttributeColumnMap {
        &self.columns
    }

    /// Classify the meta query of a new listing query.
    pub fn prepare(&self, meta_query: &MetaQuery) -> QueryContext {
        self.normalizer.normalize(meta_query)
    }

    pub fn filter_join(&self, context: &mut QueryContext, join: &str) -> String {
        self.join_rewriter.rewrite_once(context, join)
    }

    pub fn filter_where(&self, context: &mut QueryContext, where_clause: &str) -> String {
        self.where_rewriter.rewrite_once(context, where_clause)
    }

    pub fn filter_report(&self, query: ReportQuery) -> ReportRewrite {
        self.report_rewriter.rewrite(query)
    }
}
