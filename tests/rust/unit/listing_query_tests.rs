//! Listing queries: classification, JOIN and WHERE rewriting together.

#[cfg(test)]
mod listing_query_tests {
    use std::io::Write;
    use std::sync::Arc;

    use order_columns::column_map::AttributeColumnMap;
    use order_columns::meta_query::{CompareOp, MetaClause, MetaQuery, MetaValue};
    use order_columns::query_rewrite::{JoinRewriter, OrderQueryFilters, WhereRewriter};
    use order_columns::{MetaPredicateNormalizer, RewriteConfig};

    use super::super::init_logging;

    const SIDE_JOIN: &str = " INNER JOIN wp_postmeta ON ( wp_posts.ID = wp_postmeta.post_id )";

    fn single(key: &str, compare: CompareOp, value: &str) -> MetaClause {
        MetaClause::new(key, compare, MetaValue::Single(value.to_string()))
    }

    #[test]
    fn test_every_mapped_key_keeps_original_key() {
        init_logging();
        let columns = Arc::new(AttributeColumnMap::builtin());
        let normalizer = MetaPredicateNormalizer::new(Arc::clone(&columns));

        for (key, column) in columns.iter() {
            let query = MetaQuery::and(vec![single(key, CompareOp::Eq, "x").into()]);
            let ctx = normalizer.normalize(&query);

            assert!(!ctx.has_unmapped_attributes, "{} should be mapped", key);
            assert_eq!(ctx.mapped_predicates[0].key, column);
            assert_eq!(ctx.mapped_predicates[0].original_key, key);
        }
    }

    #[test]
    fn test_all_mapped_query_drops_side_table() {
        init_logging();
        let filters = OrderQueryFilters::from_config(&RewriteConfig::default()).unwrap();
        let meta_query = MetaQuery::and(vec![
            single("_billing_city", CompareOp::Eq, "Oslo").into(),
            single("_order_currency", CompareOp::NotEq, "USD").into(),
        ]);
        let where_clause = " AND ( \n  ( mt1.meta_key = '_billing_city' AND mt1.meta_value = 'Oslo' ) \n  AND \n  ( mt2.meta_key = '_order_currency' AND mt2.meta_value != 'USD' )\n)";
        let join = " INNER JOIN wp_postmeta AS mt1 ON ( wp_posts.ID = mt1.post_id )  INNER JOIN wp_postmeta AS mt2 ON ( wp_posts.ID = mt2.post_id )";

        let mut ctx = filters.prepare(&meta_query);
        let join = filters.filter_join(&mut ctx, join);
        let where_clause = filters.filter_where(&mut ctx, where_clause);

        assert!(!join.contains("INNER JOIN wp_postmeta"));
        assert_eq!(join.matches("LEFT JOIN wp_woocommerce_orders").count(), 1);
        assert_eq!(
            where_clause,
            " AND ( \n  ( wp_woocommerce_orders.billing_city = 'Oslo' ) \n  AND \n  ( wp_woocommerce_orders.currency != 'USD' )\n)"
        );
    }

    #[test]
    fn test_unmapped_key_keeps_side_table() {
        init_logging();
        let filters = OrderQueryFilters::from_config(&RewriteConfig::default()).unwrap();
        let meta_query = MetaQuery::or(vec![
            single("_billing_city", CompareOp::Eq, "Oslo").into(),
            single("_subscription_renewal", CompareOp::Eq, "1").into(),
        ]);
        let where_clause = " AND ( ( wp_postmeta.meta_key = '_billing_city' AND wp_postmeta.meta_value = 'Oslo' ) \
                            OR ( wp_postmeta.meta_key = '_subscription_renewal' AND wp_postmeta.meta_value = '1' ) )";

        let mut ctx = filters.prepare(&meta_query);
        assert!(ctx.has_unmapped_attributes);

        let join = filters.filter_join(&mut ctx, SIDE_JOIN);
        let where_clause = filters.filter_where(&mut ctx, where_clause);

        assert!(join.starts_with(SIDE_JOIN));
        assert_eq!(join.matches("LEFT JOIN wp_woocommerce_orders").count(), 1);
        assert!(where_clause.contains("( wp_woocommerce_orders.billing_city = 'Oslo' )"));
        assert!(where_clause.contains(
            "( wp_postmeta.meta_key = '_subscription_renewal' AND wp_postmeta.meta_value = '1' )"
        ));
    }

    #[test]
    fn test_customer_email_search() {
        init_logging();
        let filters = OrderQueryFilters::from_config(&RewriteConfig::default()).unwrap();
        let meta_query = MetaQuery::and(vec![MetaClause::customer_emails(single(
            "_billing_email",
            CompareOp::In,
            "",
        ))
        .into()]);
        let mut ctx = filters.prepare(&meta_query);

        let where_clause = filters.filter_where(
            &mut ctx,
            " AND ( wp_postmeta.meta_key = '_billing_email' AND wp_postmeta.meta_value IN ('a@example.com','b@example.com') )",
        );
        assert_eq!(
            where_clause,
            " AND ( wp_woocommerce_orders.billing_email IN ('a@example.com','b@example.com') )"
        );
    }

    #[test]
    fn test_flattened_tree_classifies_inner_clauses() {
        let filters = OrderQueryFilters::from_config(&RewriteConfig::default()).unwrap();
        let nested = MetaQuery::and(vec![MetaQuery::and(vec![
            single("_billing_city", CompareOp::Eq, "Oslo").into(),
            single("_billing_country", CompareOp::Eq, "NO").into(),
        ])
        .into()]);

        assert_eq!(nested.flattened().clauses.len(), 2);
        let ctx = filters.prepare(&nested);
        assert_eq!(ctx.mapped_predicates.len(), 2);
    }

    #[test]
    fn test_yaml_mapping_drives_rewrites() -> anyhow::Result<()> {
        init_logging();
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(
            file,
            "name: storefront\nattributes:\n  - key: _loyalty_tier\n    column: loyalty_tier\n"
        )?;

        let config = RewriteConfig {
            order_table: "orders".to_string(),
            mapping_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let filters = OrderQueryFilters::from_config(&config)?;
        assert_eq!(filters.columns().len(), 1);

        let mut ctx = filters.prepare(&MetaQuery::and(vec![single(
            "_loyalty_tier",
            CompareOp::Eq,
            "gold",
        )
        .into()]));
        let where_clause =
            filters.filter_where(&mut ctx, "( meta_key = '_loyalty_tier' AND meta_value = 'gold' )");
        assert_eq!(where_clause, "( orders.loyalty_tier = 'gold' )");

        // Built-in keys are not part of this mapping
        let ctx = filters.prepare(&MetaQuery::and(vec![single("_order_total", CompareOp::Eq, "1").into()]));
        assert!(ctx.has_unmapped_attributes);
        Ok(())
    }

    #[test]
    fn test_standalone_rewriters() {
        let config = RewriteConfig {
            order_table: "orders".to_string(),
            ..Default::default()
        };
        let join_rewriter = JoinRewriter::new(&config).unwrap();
        let where_rewriter = WhereRewriter::new(&config);
        let normalizer = MetaPredicateNormalizer::new(Arc::new(AttributeColumnMap::builtin()));

        let ctx = normalizer.normalize(&MetaQuery::and(vec![single("_order_total", CompareOp::Gt, "5").into()]));

        let join = join_rewriter.rewrite(SIDE_JOIN, ctx.has_unmapped_attributes);
        assert_eq!(join, " LEFT JOIN orders ON ( wp_posts.ID = orders.order_id ) ");

        let where_clause = where_rewriter.rewrite(
            "( wp_postmeta.meta_key = '_order_total' AND wp_postmeta.meta_value > '5' )",
            &ctx.mapped_predicates,
        );
        assert_eq!(where_clause, "( orders.total > '5' )");
    }
}
