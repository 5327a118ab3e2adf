use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::store::{PointsStore, StoreError};
use crate::models::points::{MembershipPoints, RoundPoints, RoundPointsRow};

#[derive(Debug, Clone)]
pub struct PointsQueries {
    pool: PgPool,
}

impl PointsQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PointsStore for PointsQueries {
    /// Every member of the tournament, with a zero bucket for members that
    /// have not scored in the round yet
    async fn round_points(&self, tournament_id: Uuid, round: u32) -> Result<Vec<RoundPoints>, StoreError> {
        let rows = sqlx::query_as::<_, RoundPointsRow>(
            r#"
            SELECT
                m.tournament_id,
                m.user_id,
                $2::INTEGER AS round,
                COALESCE(r.points, 0) AS points,
                COALESCE(r.live_points, 0) AS live_points
            FROM tournament_members m
            LEFT JOIN tournament_member_round_points r
                ON r.tournament_id = m.tournament_id
                AND r.user_id = m.user_id
                AND r.round = $2
            WHERE m.tournament_id = $1
            "#,
        )
        .bind(tournament_id)
        .bind(round as i32)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RoundPoints::from).collect())
    }

    async fn membership_points(&self, tournament_id: Uuid) -> Result<Vec<MembershipPoints>, StoreError> {
        let rows = sqlx::query_as::<_, MembershipPoints>(
            r#"
            SELECT tournament_id, user_id, points, live_points, joined_at
            FROM tournament_members
            WHERE tournament_id = $1
            "#,
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
