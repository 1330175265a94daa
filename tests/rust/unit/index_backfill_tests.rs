//! Address index backfill through the executor seam.

#[cfg(test)]
mod index_backfill_tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use order_columns::index_maintenance::{
        AddressIndex, IndexBackfillError, IndexMaintainer, OrderRecord, StatementExecutor,
        StorageError,
    };
    use order_columns::{RewriteConfig, UpdateDialect};

    use super::super::init_logging;

    /// Records statements; optionally fails on the statement at `fail_at`.
    #[derive(Default)]
    struct RecordingExecutor {
        statements: Mutex<Vec<String>>,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl StatementExecutor for RecordingExecutor {
        async fn execute(&self, statement: &str) -> Result<(), StorageError> {
            let mut statements = self.statements.lock().unwrap();
            if self.fail_at == Some(statements.len()) {
                return Err(StorageError::Backend("connection reset".to_string()));
            }
            statements.push(statement.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_backfill_statements() {
        init_logging();
        let maintainer = IndexMaintainer::new(RecordingExecutor::default(), &RewriteConfig::default());
        tokio_test::block_on(maintainer.run_index_backfill()).unwrap();

        let recorded = maintainer.executor().statements.lock().unwrap().clone();
        assert_eq!(recorded, maintainer.statements());
        assert!(recorded[0].contains("SET billing_index = CONCAT_WS(' ', billing_first_name"));
        assert!(recorded[0].contains("billing_company, billing_company"));
        assert!(recorded[0].ends_with("WHERE billing_index IS NULL OR billing_index = ''"));
        assert!(recorded[1].contains("SET shipping_index = CONCAT_WS(' ', shipping_first_name"));
        assert!(!recorded[1].contains("email"));
    }

    #[tokio::test]
    async fn test_backfill_executes_both_indexes_in_order() {
        let executor = RecordingExecutor::default();
        let config = RewriteConfig {
            order_table: "orders".to_string(),
            update_dialect: UpdateDialect::ClickHouse,
            ..Default::default()
        };
        let maintainer = IndexMaintainer::new(executor, &config);
        maintainer.run_index_backfill().await.unwrap();

        let recorded = maintainer.executor().statements.lock().unwrap().clone();
        assert_eq!(recorded.len(), 2);
        assert!(recorded[0].starts_with("ALTER TABLE orders UPDATE billing_index"));
        assert!(recorded[1].starts_with("ALTER TABLE orders UPDATE shipping_index"));
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported() {
        let executor = RecordingExecutor {
            fail_at: Some(1),
            ..Default::default()
        };
        let maintainer = IndexMaintainer::new(executor, &RewriteConfig::default());

        match maintainer.run_index_backfill().await {
            Err(IndexBackfillError::Storage { index, .. }) => assert_eq!(index, "shipping_index"),
            Ok(()) => panic!("expected the shipping backfill to fail"),
        }
        // Billing went through before the failure
        assert_eq!(maintainer.executor().statements.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_in_memory_backfill_matches_column_order() {
        let mut record = OrderRecord::new(42)
            .with("billing_first_name", "Grace")
            .with("billing_last_name", "Hopper")
            .with("billing_company", "Navy")
            .with("billing_city", "Arlington")
            .with("billing_email", "grace@example.com")
            .with("shipping_first_name", "Grace")
            .with("shipping_city", "Arlington");

        assert_eq!(record.backfill_indexes(), 2);
        assert_eq!(
            record.get("billing_index"),
            Some("Grace Hopper Navy Navy Arlington grace@example.com")
        );
        assert_eq!(record.get("shipping_index"), Some("Grace Arlington"));

        let before = record.clone();
        assert_eq!(record.backfill_indexes(), 0);
        assert_eq!(record, before);
        assert!(!AddressIndex::BILLING.needs_backfill(&record));
    }
}
