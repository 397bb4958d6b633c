use async_trait::async_trait;
use dexa_core::domain::{DatasetId, QueryId, QueryRecord, UserId};
use dexa_core::{QueryLog, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

pub struct QueryRepository {
    pool: PgPool,
}

impl QueryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_query(row: PgRow) -> Result<QueryRecord> {
        let id: Uuid = row.try_get("id")?;
        let dataset_id: Uuid = row.try_get("dataset_id")?;
        let user_id: Uuid = row.try_get("user_id")?;

        Ok(QueryRecord {
            id: QueryId(id),
            dataset_id: DatasetId(dataset_id),
            user_id: UserId(user_id),
            query_text: row.try_get("query_text")?,
            generated_code: row.try_get("generated_code")?,
            explanation: row.try_get("explanation")?,
            execution_time: row.try_get("execution_time")?,
            success: row.try_get("success")?,
            safety_issues: row.try_get("safety_issues")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl QueryLog for QueryRepository {
    async fn record_query(&self, record: &QueryRecord) -> Result<QueryRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO queries (
                id, dataset_id, user_id, query_text, generated_code, explanation,
                execution_time, success, safety_issues, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, dataset_id, user_id, query_text, generated_code, explanation,
                      execution_time, success, safety_issues, created_at
            "#,
        )
        .bind(record.id.0)
        .bind(record.dataset_id.0)
        .bind(record.user_id.0)
        .bind(&record.query_text)
        .bind(&record.generated_code)
        .bind(&record.explanation)
        .bind(record.execution_time)
        .bind(record.success)
        .bind(&record.safety_issues)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_query(row)
    }

    async fn list_queries(
        &self,
        dataset_id: &DatasetId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<QueryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, dataset_id, user_id, query_text, generated_code, explanation,
                   execution_time, success, safety_issues, created_at
            FROM queries
            WHERE dataset_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(dataset_id.0)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_query).collect()
    }
}
