use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::db::store::{ExecutionStore, StoreError};
use crate::models::execution::ExecutionRecord;

#[derive(Debug, Clone)]
pub struct ExecutionQueries {
    pool: PgPool,
}

impl ExecutionQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionStore for ExecutionQueries {
    async fn insert_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO job_executions (
                id, job_name, status, started_at, finished_at, duration_ms,
                previous_value, new_value, records_affected, metadata, error_message
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(&record.job_name)
        .bind(record.status)
        .bind(record.started_at)
        .bind(record.finished_at)
        .bind(record.duration_ms)
        .bind(&record.previous_value)
        .bind(&record.new_value)
        .bind(record.records_affected)
        .bind(&record.metadata)
        .bind(&record.error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE job_executions
            SET status = $2,
                finished_at = $3,
                duration_ms = $4,
                new_value = $5,
                records_affected = $6,
                metadata = $7,
                error_message = $8
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(record.status)
        .bind(record.finished_at)
        .bind(record.duration_ms)
        .bind(&record.new_value)
        .bind(record.records_affected)
        .bind(&record.metadata)
        .bind(&record.error_message)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "job execution",
                id: record.id.to_string(),
            });
        }
        Ok(())
    }

    async fn recent_executions(&self, limit: i64) -> Result<Vec<ExecutionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ExecutionRecord>(
            r#"
            SELECT id, job_name, status, started_at, finished_at, duration_ms,
                   previous_value, new_value, records_affected, metadata, error_message
            FROM job_executions
            ORDER BY started_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete_executions_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let deleted = sqlx::query("DELETE FROM job_executions WHERE started_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        info!("Deleted {} job executions started before {}", deleted, cutoff);
        Ok(deleted)
    }
}
