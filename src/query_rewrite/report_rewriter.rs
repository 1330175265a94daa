//! Report query rewriting.
//!
//! Aggregate reports join the side table once per attribute, under generated
//! aliases:
//!
//! ```text
//! INNER JOIN wp_postmeta AS meta__order_total
//!     ON (posts.ID = meta__order_total.post_id AND meta__order_total.meta_key = '_order_total')
//! LEFT JOIN wp_postmeta AS parent_meta__billing_email
//!     ON (posts.post_parent = parent_meta__billing_email.post_id)
//!     AND (parent_meta__billing_email.meta_key = '_billing_email')
//! ```
//!
//! `meta_<key>` joins belong to the record itself, `parent_meta_<key>` joins
//! to its parent; the ON text decides which. Every mapped alias loses its JOIN
//! fragment and its `<alias>.meta_value` references become
//! `order_meta.<column>` or `order_parent_meta.<column>`. One order table
//! LEFT JOIN is added per scope that had a mapped alias.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::errors::RewriteError;
use crate::column_map::AttributeColumnMap;
use crate::config::RewriteConfig;
use crate::utils::{is_sql_identifier, LiteralReplacer};

/// Which record a report alias reads its attribute from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinScope {
    Primary,
    Parent,
}

impl JoinScope {
    /// Fixed alias of the order table JOIN serving this scope.
    pub fn order_alias(&self) -> &'static str {
        match self {
            JoinScope::Primary => "order_meta",
            JoinScope::Parent => "order_parent_meta",
        }
    }
}

/// One aliased side-table JOIN found in a report query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinAliasMatch {
    /// `meta_<key>` or `parent_meta_<key>`
    pub alias: String,
    pub attribute_key: String,
    pub scope: JoinScope,
    /// ON condition, parentheses included
    pub on_condition: String,
    /// Entire JOIN fragment as it appears in the clause
    pub fragment: String,
}

/// Fragments of a report query as assembled by the report builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQuery {
    pub select: String,
    pub from: String,
    pub join: String,
    #[serde(rename = "where")]
    pub where_clause: String,
    pub group_by: String,
    pub order_by: String,
    pub limit: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRewrite {
    pub query: ReportQuery,
    /// Aliases now served by the order table
    pub mapped_aliases: Vec<String>,
    /// Aliases left on the side table
    pub unmapped_aliases: Vec<String>,
}

impl ReportRewrite {
    fn unchanged(query: ReportQuery, unmapped_aliases: Vec<String>) -> Self {
        Self {
            query,
            mapped_aliases: Vec::new(),
            unmapped_aliases,
        }
    }

    pub fn was_rewritten(&self) -> bool {
        !self.mapped_aliases.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ReportJoinRewriter {
    columns: Arc<AttributeColumnMap>,
    alias_join: Regex,
    /// `<alias>.<parent_column> =` marks a parent-scope ON condition
    parent_marker: String,
    primary_order_join: String,
    parent_order_join: String,
}

impl ReportJoinRewriter {
    pub fn new(columns: Arc<AttributeColumnMap>, config: &RewriteConfig) -> Result<Self, RewriteError> {
        // Captures: (1) alias, (2) attribute key, (3) ON condition, with an
        // optional second parenthesised group joined by AND
        let alias_join = Regex::new(&format!(
            r"(?im)(?:INNER|LEFT)\s+JOIN\s+{}\s+AS\s((?:parent_)?meta_(\S+))\s+ON\s+(\((?:[^)]+\)\s+AND\s+\()?[^)]+\))",
            regex::escape(&config.side_table)
        ))?;

        let alias = &config.report_primary_alias;
        let primary_order_join = format!(
            " LEFT JOIN {table} AS {scope} ON ( {alias}.{id} = {scope}.{order_id} ) ",
            table = config.order_table,
            scope = JoinScope::Primary.order_alias(),
            id = config.id_column,
            order_id = config.order_id_column,
        );
        let parent_order_join = format!(
            " LEFT JOIN {table} AS {scope} ON ( {alias}.{parent} = {scope}.{order_id} ) ",
            table = config.order_table,
            scope = JoinScope::Parent.order_alias(),
            parent = config.parent_column,
            order_id = config.order_id_column,
        );

        Ok(Self {
            columns,
            alias_join,
            parent_marker: format!("{}.{} =", alias, config.parent_column),
            primary_order_join,
            parent_order_join,
        })
    }

    /// Find every aliased side-table JOIN in `join`, in order of appearance.
    ///
    /// Aliases whose key is not a plain identifier are skipped, leaving their
    /// JOIN as it is.
    pub fn scan(&self, join: &str) -> Vec<JoinAliasMatch> {
        self.alias_join
            .captures_iter(join)
            .filter_map(|cap| {
                let fragment = cap.get(0)?.as_str();
                let alias = cap.get(1)?.as_str();
                let attribute_key = cap.get(2)?.as_str();
                let on_condition = cap.get(3)?.as_str();

                if !is_sql_identifier(attribute_key) {
                    log::warn!(
                        "Report rewrite: alias `{}` does not end in a plain key; skipping",
                        alias
                    );
                    return None;
                }

                let scope = if on_condition.contains(&self.parent_marker) {
                    JoinScope::Parent
                } else {
                    JoinScope::Primary
                };

                Some(JoinAliasMatch {
                    alias: alias.to_string(),
                    attribute_key: attribute_key.to_string(),
                    scope,
                    on_condition: on_condition.to_string(),
                    fragment: fragment.to_string(),
                })
            })
            .collect()
    }

    /// Move every mapped alias of `query` onto the order table.
    ///
    /// SELECT, WHERE and JOIN are rewritten with the same substitutions so an
    /// alias referenced in several clauses stays consistent. Unmapped aliases
    /// and the remaining fragments pass through untouched.
    pub fn rewrite(&self, query: ReportQuery) -> ReportRewrite {
        if query.join.is_empty() {
            return ReportRewrite::unchanged(query, Vec::new());
        }

        let matches = self.scan(&query.join);
        if matches.is_empty() {
            return ReportRewrite::unchanged(query, Vec::new());
        }

        let mut substitutions: Vec<(String, String)> = Vec::with_capacity(matches.len() * 2);
        let mut mapped_aliases = Vec::new();
        let mut unmapped_aliases = Vec::new();
        let mut primary_used = false;
        let mut parent_used = false;

        for found in matches {
            let Some(column) = self.columns.column_for(&found.attribute_key) else {
                log::debug!(
                    "Report rewrite: `{}` has no column; keeping side-table join",
                    found.attribute_key
                );
                unmapped_aliases.push(found.alias);
                continue;
            };

            match found.scope {
                JoinScope::Primary => primary_used = true,
                JoinScope::Parent => parent_used = true,
            }

            substitutions.push((
                format!("{}.meta_value", found.alias),
                format!("{}.{}", found.scope.order_alias(), column),
            ));
            substitutions.push((found.fragment, String::new()));

            log::debug!(
                "Report rewrite: {} → {}.{}",
                found.alias,
                found.scope.order_alias(),
                column
            );
            mapped_aliases.push(found.alias);
        }

        if mapped_aliases.is_empty() {
            return ReportRewrite::unchanged(query, unmapped_aliases);
        }

        let replacer = match LiteralReplacer::new(substitutions) {
            Ok(replacer) => replacer,
            Err(e) => {
                log::warn!("Report rewrite: cannot build substitutions: {}", e);
                return ReportRewrite::unchanged(query, unmapped_aliases);
            }
        };

        let mut rewritten = ReportQuery {
            select: replacer.apply(&query.select),
            where_clause: replacer.apply(&query.where_clause),
            join: replacer.apply(&query.join),
            ..query
        };

        if primary_used {
            rewritten.join.push_str(&self.primary_order_join);
        }
        if parent_used {
            rewritten.join.push_str(&self.parent_order_join);
        }

        log::info!(
            "Report rewrite: {} alias(es) moved to the order table, {} left on the side table",
            mapped_aliases.len(),
            unmapped_aliases.len()
        );

        ReportRewrite {
            query: rewritten,
            mapped_aliases,
            unmapped_aliases,
        }
    }
}
