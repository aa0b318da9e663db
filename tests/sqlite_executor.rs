//! SQLite-backed executor and pipeline tests against a temporary database.

use async_trait::async_trait;
use nlsql::llm::{PromptBuilder, QueryGenerator};
use nlsql::query::{Backend, QueryExecutor, SqlDialect, SqlxExecutor};
use nlsql::schema::{retail_schema, SchemaCatalog};
use nlsql::{ExecutionError, GenerationError, Pipeline, PipelineResult};
use serde_json::{json, Value};
use sqlx::{Connection, Executor, SqliteConnection};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SEED: &str = r#"
CREATE TABLE customer_info (
    customer_id INTEGER PRIMARY KEY,
    age INTEGER,
    gender TEXT,
    location TEXT,
    membership_years INTEGER
);
INSERT INTO customer_info VALUES (1, 34, 'Female', 'Urban', 3);
INSERT INTO customer_info VALUES (2, 51, 'Male', 'Rural', 7);
INSERT INTO customer_info VALUES (3, NULL, 'Other', 'Suburban', 1);

CREATE TABLE promotional_data (
    promotion_id INTEGER PRIMARY KEY,
    promotion_effectiveness REAL,
    promotion_start_date TEXT,
    promotion_end_date TEXT
);
INSERT INTO promotional_data VALUES (1, 0.4567, '2024-01-01', '2024-01-31');
INSERT INTO promotional_data VALUES (2, 0.125, '2024-02-01', '2024-02-29');
"#;

async fn seeded_db() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("retail.db").display());

    let mut conn = SqliteConnection::connect(&url).await.unwrap();
    conn.execute(SEED).await.unwrap();
    conn.close().await.unwrap();

    (dir, url)
}

fn executor(url: &str) -> SqlxExecutor {
    SqlxExecutor::new(url, Duration::from_secs(5), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_select_returns_columns_and_rows() {
    let (_dir, url) = seeded_db().await;
    let exec = executor(&url);
    assert_eq!(exec.backend(), Backend::Sqlite);

    let output = exec
        .execute("SELECT customer_id, age, gender FROM customer_info ORDER BY customer_id")
        .await
        .unwrap();

    assert_eq!(output.columns, vec!["customer_id", "age", "gender"]);
    assert_eq!(
        output.rows,
        vec![
            vec![json!(1), json!(34), json!("Female")],
            vec![json!(2), json!(51), json!("Male")],
            vec![json!(3), Value::Null, json!("Other")],
        ]
    );
}

#[tokio::test]
async fn test_aggregate_count() {
    let (_dir, url) = seeded_db().await;

    let output = executor(&url)
        .execute("SELECT COUNT(*) FROM customer_info;")
        .await
        .unwrap();

    assert_eq!(output.columns, vec!["COUNT(*)"]);
    assert_eq!(output.rows, vec![vec![json!(3)]]);
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let (_dir, url) = seeded_db().await;

    let output = executor(&url)
        .execute("SELECT customer_id, location FROM customer_info WHERE age > 100")
        .await
        .unwrap();

    assert_eq!(output.columns, vec!["customer_id", "location"]);
    assert!(output.rows.is_empty());
}

#[tokio::test]
async fn test_unknown_column_is_statement_error() {
    let (_dir, url) = seeded_db().await;

    let err = executor(&url)
        .execute("SELECT nonexistent_col FROM customer_info;")
        .await
        .unwrap_err();

    match err {
        ExecutionError::Statement(msg) => assert!(msg.contains("nonexistent_col")),
        other => panic!("expected statement error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_each_call_uses_a_fresh_connection() {
    let (_dir, url) = seeded_db().await;
    let exec = executor(&url);

    assert!(exec.execute("SELECT * FROM missing_table").await.is_err());
    let output = exec.execute("SELECT COUNT(*) AS n FROM promotional_data").await.unwrap();
    assert_eq!(output.rows, vec![vec![json!(2)]]);
}

struct FixedGenerator(&'static str);

#[async_trait]
impl QueryGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Ok(self.0.to_string())
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

#[tokio::test]
async fn test_pipeline_formats_rates_from_real_rows() {
    let (_dir, url) = seeded_db().await;
    let pipeline = Pipeline::new(
        Arc::new(FixedGenerator(
            "SELECT promotion_id, promotion_effectiveness AS promotion_effectiveness_rate \
             FROM promotional_data ORDER BY promotion_id;",
        )),
        Arc::new(executor(&url)),
        Arc::new(SchemaCatalog::new(retail_schema()).unwrap()),
        PromptBuilder::new(SqlDialect::Sqlite),
    );

    let result = pipeline.answer("How effective was each promotion?").await;

    match result {
        PipelineResult::Success { columns, rows, .. } => {
            assert_eq!(columns, vec!["promotion_id", "promotion_effectiveness_rate"]);
            assert_eq!(
                rows,
                vec![
                    vec![json!(1), json!("45.67%")],
                    vec![json!(2), json!("12.50%")],
                ]
            );
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_pipeline_reports_engine_error() {
    let (_dir, url) = seeded_db().await;
    let sql = "SELECT shoe_size FROM customer_info;";
    let pipeline = Pipeline::new(
        Arc::new(FixedGenerator(sql)),
        Arc::new(executor(&url)),
        Arc::new(SchemaCatalog::new(retail_schema()).unwrap()),
        PromptBuilder::new(SqlDialect::Sqlite),
    );

    let result = pipeline.answer("What shoe size does each customer wear?").await;

    assert!(matches!(result, PipelineResult::ExecutionFailed { .. }));
    assert_eq!(result.sql(), Some(sql));
    assert!(!result.error_message().unwrap().is_empty());
}
