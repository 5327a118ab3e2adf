use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::db::store::{RoundConfigStore, StoreError};
use crate::models::round_config::{CurrentRoundConfig, RoundUpdater};

#[derive(Debug, sqlx::FromRow)]
struct RoundConfigRow {
    current_round: i32,
    updated_at: DateTime<Utc>,
    updated_by: RoundUpdater,
}

impl From<RoundConfigRow> for CurrentRoundConfig {
    fn from(row: RoundConfigRow) -> Self {
        CurrentRoundConfig {
            round: row.current_round.max(1) as u32,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoundConfigQueries {
    pool: PgPool,
}

impl RoundConfigQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoundConfigStore for RoundConfigQueries {
    async fn get_current_round(&self) -> Result<Option<CurrentRoundConfig>, StoreError> {
        let row = sqlx::query_as::<_, RoundConfigRow>(
            "SELECT current_round, updated_at, updated_by FROM round_config WHERE id = TRUE",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CurrentRoundConfig::from))
    }

    /// Upserts the singleton row
    async fn set_current_round(
        &self,
        round: u32,
        updated_by: RoundUpdater,
    ) -> Result<CurrentRoundConfig, StoreError> {
        let row = sqlx::query_as::<_, RoundConfigRow>(
            r#"
            INSERT INTO round_config (id, current_round, updated_at, updated_by)
            VALUES (TRUE, $1, NOW(), $2)
            ON CONFLICT (id) DO UPDATE SET
                current_round = EXCLUDED.current_round,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            RETURNING current_round, updated_at, updated_by
            "#,
        )
        .bind(round as i32)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await?;

        info!("Current round set to {} by {}", round, updated_by);
        Ok(row.into())
    }
}
