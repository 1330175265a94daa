//! JOIN clause rewriting for order queries.
//!
//! Once every meta clause of a query points at an order table column, the
//! builder's INNER JOIN on the side table only multiplies rows. It is dropped,
//! and the order table is attached with a single LEFT JOIN:
//!
//! ```text
//!  INNER JOIN wp_postmeta ON ( wp_posts.ID = wp_postmeta.post_id )
//!    → LEFT JOIN wp_woocommerce_orders ON ( wp_posts.ID = wp_woocommerce_orders.order_id )
//! ```

use regex::Regex;

use super::errors::RewriteError;
use super::query_context::QueryContext;
use crate::config::RewriteConfig;

#[derive(Debug, Clone)]
pub struct JoinRewriter {
    /// Matches ` INNER JOIN <side_table> [AS alias] ON (...)`
    side_table_join: Regex,
    order_join: String,
}

impl JoinRewriter {
    pub fn new(config: &RewriteConfig) -> Result<Self, RewriteError> {
        let side_table_join = Regex::new(&format!(
            r"(?i)\sINNER\sJOIN\s{}\s+(?:AS\s\S+)?\s*ON\s\([^)]+\)",
            regex::escape(&config.side_table)
        ))?;

        let order_join = format!(
            " LEFT JOIN {order} ON ( {primary}.{id} = {order}.{order_id} ) ",
            order = config.order_table,
            primary = config.primary_table,
            id = config.id_column,
            order_id = config.order_id_column,
        );

        Ok(Self {
            side_table_join,
            order_join,
        })
    }

    /// Rewrite `join`, dropping side-table INNER JOINs unless some clause
    /// still needs them. The order table LEFT JOIN is always appended.
    pub fn rewrite(&self, join: &str, has_unmapped_attributes: bool) -> String {
        let mut result = if has_unmapped_attributes {
            join.to_string()
        } else {
            let removed = self.side_table_join.find_iter(join).count();
            if removed == 0 {
                log::debug!("JOIN rewrite: no side-table INNER JOIN found");
            } else {
                log::debug!("JOIN rewrite: dropping {} side-table INNER JOIN(s)", removed);
            }
            self.side_table_join.replace_all(join, "").into_owned()
        };

        result.push_str(&self.order_join);
        result
    }

    /// Rewrite at most once per query; later calls return `join` unchanged.
    pub fn rewrite_once(&self, context: &mut QueryContext, join: &str) -> String {
        if !context.join_pass().claim() {
            log::debug!("JOIN rewrite already applied for this query; skipping");
            return join.to_string();
        }
        self.rewrite(join, context.has_unmapped_attributes)
    }
}
