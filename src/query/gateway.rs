//! Query gateway
//!
//! Read-only operations exposed to remote callers. Every call is a single
//! stateless request against the backend; results come back as ordered
//! [`Record`]s.
//!
//! # Example
//!
//! ```rust,no_run
//! use deck_db::database::SqliteBackend;
//! use deck_db::query::QueryGateway;
//! use std::sync::Arc;
//!
//! # async fn run() -> deck_db::Result<()> {
//! let backend = SqliteBackend::connect("sqlite://mcp_deck.db").await?;
//! let gateway = QueryGateway::new(Arc::new(backend));
//! let history = gateway.get_purchase_history("c1").await?;
//! let details = gateway.get_product_details(&["108775015".to_string()]).await?;
//! # Ok(())
//! # }
//! ```

use crate::database::Backend;
use crate::error::{DeckError, Result};
use crate::query::parser::QueryParser;
use crate::types::{Record, Value};
use crate::utils::Helpers;
use log::debug;
use std::sync::Arc;

/// Purchases of one customer, oldest first
pub const PURCHASE_HISTORY_SQL: &str =
    "SELECT * FROM transactions WHERE customer_id = ? ORDER BY t_dat ASC";

/// Article lookup; `{placeholders}` is replaced by one `?` per id
pub const PRODUCT_DETAILS_SQL: &str = "SELECT * FROM articles WHERE article_id IN ({placeholders})";

/// Read-only query operations over a backend
#[derive(Clone)]
pub struct QueryGateway {
    backend: Arc<dyn Backend>,
    parser: Arc<QueryParser>,
}

impl QueryGateway {
    /// Create a gateway over a shared backend
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            parser: Arc::new(QueryParser::new()),
        }
    }

    /// Execute an arbitrary read statement on a read-only connection
    ///
    /// # Returns
    /// `Err(DeckError::QueryRejected)` if the text is recognizably not a
    /// single read query, `Err(DeckError::Query)` if the database rejects it
    pub async fn run_query(&self, sql: &str) -> Result<Vec<Record>> {
        debug!("run_query: {}", sql);
        self.parser.check_read_only(sql)?;
        self.fetch(sql, &[]).await
    }

    /// Purchase history of a customer, sorted by transaction date ascending
    pub async fn get_purchase_history(&self, user_id: &str) -> Result<Vec<Record>> {
        debug!("get_purchase_history: {}", user_id);
        self.fetch(PURCHASE_HISTORY_SQL, &[Value::from(user_id)])
            .await
    }

    /// Details of the given articles
    ///
    /// An empty id list returns no rows without querying.
    pub async fn get_product_details(&self, product_ids: &[String]) -> Result<Vec<Record>> {
        debug!("get_product_details: {} id(s)", product_ids.len());
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = PRODUCT_DETAILS_SQL.replace("{placeholders}", &Helpers::placeholders(product_ids.len()));
        let params: Vec<Value> = product_ids.iter().map(|id| Value::from(id.as_str())).collect();
        self.fetch(&sql, &params).await
    }

    async fn fetch(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        self.backend
            .fetch_read_only(sql, params)
            .await
            .map_err(|err| match err {
                DeckError::BackendExecution(source) => DeckError::Query(source),
                other => other,
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::backend::tests::{scratch_backend, RecordingBackend};
    use crate::database::InsertMode;
    use crate::types::Row;

    pub(crate) async fn seeded() -> (tempfile::TempDir, QueryGateway) {
        let (dir, backend) = scratch_backend().await;
        backend
            .execute("CREATE TABLE articles (article_id BIGINT NOT NULL, prod_name TEXT NULL, PRIMARY KEY (article_id));")
            .await
            .unwrap();
        backend
            .execute("CREATE TABLE transactions (t_dat DATETIME NOT NULL, customer_id TEXT NOT NULL, article_id BIGINT NOT NULL, price DOUBLE NULL);")
            .await
            .unwrap();

        let articles = vec![
            Row::new(vec![Value::Integer(108775015), Value::from("Strap top")]),
            Row::new(vec![Value::Integer(108775044), Value::from("Strap top (1)")]),
            Row::new(vec![Value::Integer(110065001), Value::from("OP T-shirt")]),
        ];
        backend
            .insert_many(
                "articles",
                &["article_id".to_string(), "prod_name".to_string()],
                &articles,
                InsertMode::Append,
            )
            .await
            .unwrap();

        let day = |d: u32| {
            chrono::NaiveDate::from_ymd_opt(2020, 9, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let transactions = vec![
            Row::new(vec![Value::Timestamp(day(20)), Value::from("x"), Value::Integer(108775015), Value::Float(0.05)]),
            Row::new(vec![Value::Timestamp(day(3)), Value::from("y"), Value::Integer(110065001), Value::Float(0.01)]),
            Row::new(vec![Value::Timestamp(day(1)), Value::from("x"), Value::Integer(108775044), Value::Null]),
            Row::new(vec![Value::Timestamp(day(11)), Value::from("x"), Value::Integer(110065001), Value::Float(0.02)]),
        ];
        backend
            .insert_many(
                "transactions",
                &[
                    "t_dat".to_string(),
                    "customer_id".to_string(),
                    "article_id".to_string(),
                    "price".to_string(),
                ],
                &transactions,
                InsertMode::Append,
            )
            .await
            .unwrap();

        (dir, QueryGateway::new(Arc::new(backend)))
    }

    fn timestamp_day(record: &Record) -> u32 {
        use chrono::Datelike;
        match record.get("t_dat") {
            Some(Value::Timestamp(ts)) => ts.day(),
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_purchase_history_filters_and_sorts() {
        let (_dir, gateway) = seeded().await;

        let history = gateway.get_purchase_history("x").await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history
            .iter()
            .all(|r| r.get("customer_id") == Some(&Value::from("x"))));
        let days: Vec<u32> = history.iter().map(timestamp_day).collect();
        assert_eq!(days, vec![1, 11, 20]);
        assert_eq!(
            history[0].columns().collect::<Vec<_>>(),
            vec!["t_dat", "customer_id", "article_id", "price"]
        );

        let other = gateway.get_purchase_history("y").await.unwrap();
        assert_eq!(other.len(), 1);
        assert!(gateway.get_purchase_history("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_product_details() {
        let (_dir, gateway) = seeded().await;

        let details = gateway
            .get_product_details(&["108775015".to_string(), "110065001".to_string()])
            .await
            .unwrap();
        let mut ids: Vec<_> = details
            .iter()
            .map(|r| r.get("article_id").cloned().unwrap())
            .collect();
        ids.sort_by_key(|v| match v {
            Value::Integer(i) => *i,
            _ => 0,
        });
        assert_eq!(ids, vec![Value::Integer(108775015), Value::Integer(110065001)]);

        assert!(gateway.get_product_details(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_query() {
        let (_dir, gateway) = seeded().await;

        let rows = gateway
            .run_query("SELECT customer_id, COUNT(*) AS n FROM transactions GROUP BY customer_id ORDER BY customer_id")
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("customer_id"), Some(&Value::from("x")));
        assert_eq!(rows[0].get("n"), Some(&Value::Integer(3)));
    }

    #[tokio::test]
    async fn test_run_query_errors() {
        let (_dir, gateway) = seeded().await;

        let err = gateway.run_query("DROP TABLE articles").await.unwrap_err();
        assert!(matches!(err, DeckError::QueryRejected(_)));

        let err = gateway
            .run_query("SELECT * FROM no_such_table")
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::Query(_)));
        assert!(err.is_query_error());

        // unparsed by sqlparser, stopped by the read-only connection
        let err = gateway
            .run_query("DELETE FROM articles WHERE prod_name GLOB 'S*'")
            .await
            .unwrap_err();
        assert!(err.is_query_error());
        assert_eq!(
            gateway.run_query("SELECT * FROM articles").await.unwrap().len(),
            3
        );

        let err = gateway.run_query("SELEC * FRM articles").await.unwrap_err();
        assert!(matches!(err, DeckError::Query(_)));
    }

    #[tokio::test]
    async fn test_run_query_sqlite_syntax() {
        let (_dir, gateway) = seeded().await;

        let rows = gateway
            .run_query("SELECT prod_name FROM articles WHERE prod_name GLOB 'Strap*' ORDER BY article_id")
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.get("prod_name").cloned().unwrap()).collect();
        assert_eq!(names, vec![Value::from("Strap top"), Value::from("Strap top (1)")]);
    }

    #[tokio::test]
    async fn test_empty_ids_never_reach_backend() {
        let backend = Arc::new(RecordingBackend::default());
        let gateway = QueryGateway::new(backend.clone());
        gateway.get_product_details(&[]).await.unwrap();
        assert!(backend.statements().is_empty());

        gateway
            .get_product_details(&["1".to_string(), "2".to_string()])
            .await
            .unwrap();
        assert_eq!(
            backend.statements(),
            vec!["SELECT * FROM articles WHERE article_id IN (?, ?)"]
        );
    }
}
