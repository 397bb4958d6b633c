use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dexa_core::domain::{ContentHash, Dataset, DatasetId, FileType, SampleRow, UserId};
use dexa_core::{DatasetStore, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

pub struct DatasetRepository {
    pool: PgPool,
}

impl DatasetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_dataset(row: PgRow) -> Result<Dataset> {
        let id: Uuid = row.try_get("id")?;
        let user_id: Uuid = row.try_get("user_id")?;
        let file_type: String = row.try_get("file_type")?;
        let checksum: String = row.try_get("checksum")?;
        let sample_json: serde_json::Value = row.try_get("sample")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        let sample: Vec<SampleRow> = serde_json::from_value(sample_json)?;

        Ok(Dataset {
            id: DatasetId(id),
            user_id: UserId(user_id),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            file_type: file_type.parse::<FileType>()?,
            file_name: row.try_get("file_name")?,
            blob_key: row.try_get("blob_key")?,
            size_bytes: row.try_get("size_bytes")?,
            checksum: ContentHash(checksum),
            columns: row.try_get("columns")?,
            row_count: row.try_get("row_count")?,
            sample,
            full_content: row.try_get("full_content")?,
            created_at,
        })
    }
}

#[async_trait]
impl DatasetStore for DatasetRepository {
    async fn insert_dataset(&self, dataset: &Dataset) -> Result<Dataset> {
        let sample_json = serde_json::to_value(&dataset.sample)?;

        let row = sqlx::query(
            r#"
            INSERT INTO datasets (
                id, user_id, name, description, file_type, file_name, blob_key,
                size_bytes, checksum, columns, row_count, sample, full_content, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, user_id, name, description, file_type, file_name, blob_key,
                      size_bytes, checksum, columns, row_count, sample, full_content, created_at
            "#,
        )
        .bind(dataset.id.0)
        .bind(dataset.user_id.0)
        .bind(&dataset.name)
        .bind(&dataset.description)
        .bind(dataset.file_type.as_str())
        .bind(&dataset.file_name)
        .bind(&dataset.blob_key)
        .bind(dataset.size_bytes)
        .bind(dataset.checksum.as_str())
        .bind(&dataset.columns)
        .bind(dataset.row_count)
        .bind(sample_json)
        .bind(&dataset.full_content)
        .bind(dataset.created_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_dataset(row)
    }

    async fn get_dataset(&self, id: &DatasetId) -> Result<Option<Dataset>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, description, file_type, file_name, blob_key,
                   size_bytes, checksum, columns, row_count, sample, full_content, created_at
            FROM datasets
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_dataset).transpose()
    }

    async fn list_datasets(&self, user_id: &UserId, limit: i64, offset: i64) -> Result<Vec<Dataset>> {
        // Listings never carry the raw file body.
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, description, file_type, file_name, blob_key,
                   size_bytes, checksum, columns, row_count, sample,
                   NULL::text AS full_content, created_at
            FROM datasets
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id.0)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_dataset).collect()
    }

    async fn delete_dataset(&self, id: &DatasetId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM datasets WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        crate::postgres::health_check(&self.pool).await
    }
}
