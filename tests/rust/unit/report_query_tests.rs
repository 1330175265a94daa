//! Report queries with several side-table aliases.

#[cfg(test)]
mod report_query_tests {
    use std::sync::Arc;

    use order_columns::column_map::AttributeColumnMap;
    use order_columns::query_rewrite::{JoinScope, OrderQueryFilters, ReportJoinRewriter, ReportQuery};
    use order_columns::RewriteConfig;

    use super::super::init_logging;

    fn sales_report() -> ReportQuery {
        ReportQuery {
            select: "SELECT SUM( meta__order_total.meta_value) as total_sales, \
                     SUM( meta__order_shipping.meta_value) as total_shipping, \
                     SUM( parent_meta__order_tax.meta_value) as parent_tax, \
                     meta__wcpdf_invoice_number.meta_value as invoice"
                .to_string(),
            from: "FROM wp_posts AS posts".to_string(),
            join: " INNER JOIN wp_postmeta AS meta__order_total ON (posts.ID = meta__order_total.post_id AND meta__order_total.meta_key = '_order_total') \
                   INNER JOIN wp_postmeta AS meta__order_shipping ON (posts.ID = meta__order_shipping.post_id AND meta__order_shipping.meta_key = '_order_shipping') \
                   LEFT JOIN wp_postmeta AS parent_meta__order_tax ON (posts.post_parent = parent_meta__order_tax.post_id) AND (parent_meta__order_tax.meta_key = '_order_tax') \
                   LEFT JOIN wp_postmeta AS meta__wcpdf_invoice_number ON (posts.ID = meta__wcpdf_invoice_number.post_id AND meta__wcpdf_invoice_number.meta_key = '_wcpdf_invoice_number')"
                .to_string(),
            where_clause: "WHERE posts.post_type IN ( 'shop_order','shop_order_refund' ) AND meta__order_total.meta_value > 0"
                .to_string(),
            group_by: "GROUP BY posts.ID".to_string(),
            order_by: String::new(),
            limit: String::new(),
        }
    }

    #[test]
    fn test_sales_report_rewrite() {
        init_logging();
        let filters = OrderQueryFilters::from_config(&RewriteConfig::default()).unwrap();
        let result = filters.filter_report(sales_report());
        let q = &result.query;

        assert_eq!(
            result.mapped_aliases,
            vec!["meta__order_total", "meta__order_shipping", "parent_meta__order_tax"]
        );
        assert_eq!(result.unmapped_aliases, vec!["meta__wcpdf_invoice_number"]);

        assert!(q.select.contains("SUM( order_meta.total) as total_sales"));
        assert!(q.select.contains("SUM( order_meta.shipping_total) as total_shipping"));
        assert!(q.select.contains("SUM( order_parent_meta.cart_tax) as parent_tax"));
        assert!(q.select.contains("meta__wcpdf_invoice_number.meta_value as invoice"));
        assert!(q.where_clause.ends_with("AND order_meta.total > 0"));

        assert!(q.join.contains("AS meta__wcpdf_invoice_number ON"));
        assert!(!q.join.contains("AS meta__order_total"));
        assert!(!q.join.contains("AS parent_meta__order_tax"));
        assert_eq!(q.join.matches("AS order_meta ON").count(), 1);
        assert_eq!(q.join.matches("AS order_parent_meta ON").count(), 1);
        assert!(q.join.contains(
            "LEFT JOIN wp_woocommerce_orders AS order_meta ON ( posts.ID = order_meta.order_id )"
        ));
        assert!(q.join.contains(
            "LEFT JOIN wp_woocommerce_orders AS order_parent_meta ON ( posts.post_parent = order_parent_meta.order_id )"
        ));

        assert_eq!(q.from, "FROM wp_posts AS posts");
        assert_eq!(q.group_by, "GROUP BY posts.ID");
    }

    #[test]
    fn test_color_and_size_aliases() {
        let columns = AttributeColumnMap::from_pairs([("color", "color")]).unwrap();
        let config = RewriteConfig {
            order_table: "orders".to_string(),
            ..Default::default()
        };
        let rewriter = ReportJoinRewriter::new(Arc::new(columns), &config).unwrap();

        let color_join = "INNER JOIN wp_postmeta AS meta_color ON (posts.ID = meta_color.post_id AND meta_color.meta_key = 'color')";
        let size_join = "INNER JOIN wp_postmeta AS meta_size ON (posts.ID = meta_size.post_id AND meta_size.meta_key = 'size')";
        let query = ReportQuery {
            select: "SELECT meta_color.meta_value, meta_size.meta_value, COUNT(*)".to_string(),
            join: format!(" {} {}", color_join, size_join),
            where_clause: "WHERE meta_color.meta_value IN ('red') AND meta_size.meta_value = 'L'".to_string(),
            ..Default::default()
        };

        let found = rewriter.scan(&query.join);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|m| m.scope == JoinScope::Primary));

        let result = rewriter.rewrite(query);
        let q = &result.query;
        assert!(!q.join.contains(color_join));
        assert!(q.join.contains(size_join));
        assert_eq!(q.join.matches("LEFT JOIN orders AS order_meta").count(), 1);
        assert_eq!(q.select, "SELECT order_meta.color, meta_size.meta_value, COUNT(*)");
        assert_eq!(
            q.where_clause,
            "WHERE order_meta.color IN ('red') AND meta_size.meta_value = 'L'"
        );
    }

    #[test]
    fn test_report_without_side_table_joins() {
        let filters = OrderQueryFilters::from_config(&RewriteConfig::default()).unwrap();
        let query = ReportQuery {
            select: "SELECT COUNT(posts.ID)".to_string(),
            from: "FROM wp_posts AS posts".to_string(),
            ..Default::default()
        };
        let result = filters.filter_report(query.clone());

        assert!(!result.was_rewritten());
        assert_eq!(result.query, query);
    }
}
