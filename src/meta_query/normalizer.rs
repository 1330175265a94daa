//! Classification of meta clauses into column-mapped and pass-through.
//!
//! Clauses whose key has a column become [`MetaPredicate`]s carrying both the
//! column and the original key. Clauses without one are left to the side
//! table and flag the query so its side-table JOIN survives.

use std::sync::Arc;

use super::{MetaClause, MetaPredicate, MetaQuery, MetaQueryNode};
use crate::column_map::AttributeColumnMap;
use crate::query_rewrite::QueryContext;

/// Column targeted by the `customer_emails` alias
pub const CUSTOMER_EMAILS_COLUMN: &str = "billing_email";
/// Column targeted by the `customer_ids` alias
pub const CUSTOMER_IDS_COLUMN: &str = "customer_id";

#[derive(Debug, Clone)]
pub struct MetaPredicateNormalizer {
    columns: Arc<AttributeColumnMap>,
}

impl MetaPredicateNormalizer {
    pub fn new(columns: Arc<AttributeColumnMap>) -> Self {
        Self { columns }
    }

    /// Classify every clause of `query` into a fresh [`QueryContext`].
    ///
    /// The query itself is not modified; unmapped clauses keep working against
    /// the side table exactly as the upstream builder compiled them.
    pub fn normalize(&self, query: &MetaQuery) -> QueryContext {
        let mut context = QueryContext::new();
        let query = query.flattened();

        for node in &query.clauses {
            self.classify_node(node, &mut context);
        }

        log::debug!(
            "Meta query classified: {} mapped, side table {}",
            context.mapped_predicates.len(),
            if context.has_unmapped_attributes {
                "still required"
            } else {
                "not required"
            }
        );
        context
    }

    fn classify_node(&self, node: &MetaQueryNode, context: &mut QueryContext) {
        match node {
            MetaQueryNode::Clause(clause) => self.classify_clause(clause, context),
            MetaQueryNode::Group(group) => {
                for child in &group.clauses {
                    self.classify_node(child, context);
                }
            }
        }
    }

    fn classify_clause(&self, clause: &MetaClause, context: &mut QueryContext) {
        if let Some(alias) = &clause.customer_emails {
            context.push_mapped(alias_predicate(alias, CUSTOMER_EMAILS_COLUMN));
        }

        if let Some(alias) = &clause.customer_ids {
            context.push_mapped(alias_predicate(alias, CUSTOMER_IDS_COLUMN));
        }

        let Some(key) = &clause.key else {
            return;
        };

        match self.columns.column_for(key) {
            Some(column) => {
                context.push_mapped(MetaPredicate {
                    key: column.to_string(),
                    original_key: key.clone(),
                    compare: clause.compare,
                    value: clause.value.clone(),
                    value_type: clause.value_type,
                });
            }
            None => {
                log::debug!("Meta key `{}` has no column; passing through", key);
                context.mark_unmapped();
            }
        }
    }
}

/// The alias clause keeps its comparison; only the target column is fixed.
/// An alias without a key of its own is matched under the column name.
fn alias_predicate(alias: &MetaClause, column: &str) -> MetaPredicate {
    MetaPredicate {
        key: column.to_string(),
        original_key: alias.key.clone().unwrap_or_else(|| column.to_string()),
        compare: alias.compare,
        value: alias.value.clone(),
        value_type: alias.value_type,
    }
}
