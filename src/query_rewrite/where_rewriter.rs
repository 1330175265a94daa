//! WHERE clause rewriting for order queries.
//!
//! The builder compiles each meta clause as
//! `( [alias.]meta_key = '<key>' AND [alias.]meta_value <op> <value> )`.
//! For mapped clauses the key test and the `meta_value` operand are swapped
//! for the order column; the operator, value and closing parenthesis stay as
//! the builder emitted them.

use regex::{NoExpand, Regex};
use std::borrow::Cow;

use super::query_context::QueryContext;
use crate::config::RewriteConfig;
use crate::meta_query::MetaPredicate;
use crate::utils::{is_sql_identifier, quote_string_literal};

#[derive(Debug, Clone)]
pub struct WhereRewriter {
    order_table: String,
}

impl WhereRewriter {
    pub fn new(config: &RewriteConfig) -> Self {
        Self {
            order_table: config.order_table.clone(),
        }
    }

    /// Point every fragment of `where_clause` that tests a mapped predicate's
    /// original key at its column. Predicates absent from the text are skipped.
    pub fn rewrite(&self, where_clause: &str, predicates: &[MetaPredicate]) -> String {
        let mut result = where_clause.to_string();

        for predicate in predicates {
            if !is_sql_identifier(&predicate.key) {
                log::warn!(
                    "WHERE rewrite: `{}` is not a column identifier; leaving `{}` on the side table",
                    predicate.key,
                    predicate.original_key
                );
                continue;
            }

            let pattern = match key_test_pattern(&predicate.original_key) {
                Ok(pattern) => pattern,
                Err(e) => {
                    log::warn!(
                        "WHERE rewrite: cannot build pattern for `{}`: {}",
                        predicate.original_key,
                        e
                    );
                    continue;
                }
            };

            let replacement = format!("( {}.{} ", self.order_table, predicate.key);
            let rewritten = match pattern.replace_all(&result, NoExpand(&replacement)) {
                Cow::Owned(rewritten) => Some(rewritten),
                Cow::Borrowed(_) => None,
            };

            match rewritten {
                Some(rewritten) => {
                    log::debug!(
                        "WHERE rewrite: meta key `{}` → {}.{}",
                        predicate.original_key,
                        self.order_table,
                        predicate.key
                    );
                    result = rewritten;
                }
                None => log::debug!(
                    "WHERE rewrite: meta key `{}` not present in clause",
                    predicate.original_key
                ),
            }
        }

        result
    }

    /// Rewrite at most once per query, using the predicates classified for it.
    pub fn rewrite_once(&self, context: &mut QueryContext, where_clause: &str) -> String {
        if !context.where_pass().claim() {
            log::debug!("WHERE rewrite already applied for this query; skipping");
            return where_clause.to_string();
        }
        if context.mapped_predicates.is_empty() {
            return where_clause.to_string();
        }
        self.rewrite(where_clause, &context.mapped_predicates)
    }
}

/// `( [alias.]meta_key = '<key>' AND [alias.]meta_value `, case-insensitive.
fn key_test_pattern(original_key: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?i)\(\s?(?:\w+\.)?meta_key = {} AND (?:\w+\.)?meta_value ",
        regex::escape(&quote_string_literal(original_key))
    ))
}
