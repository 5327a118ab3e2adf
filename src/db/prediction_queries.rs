use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::store::{PredictionStore, SettlementWrite, StoreError};
use crate::models::prediction::{Prediction, PredictionRow};

#[derive(Debug, sqlx::FromRow)]
struct LockedPrediction {
    user_id: Uuid,
    processed: bool,
    live_points: i32,
}

#[derive(Debug, Clone)]
pub struct PredictionQueries {
    pool: PgPool,
}

impl PredictionQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_prediction(
        tx: &mut Transaction<'_, Postgres>,
        prediction_id: Uuid,
    ) -> Result<LockedPrediction, StoreError> {
        sqlx::query_as::<_, LockedPrediction>(
            "SELECT user_id, processed, live_points FROM predictions WHERE id = $1 FOR UPDATE",
        )
        .bind(prediction_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            entity: "prediction",
            id: prediction_id.to_string(),
        })
    }

    /// Adds the given deltas to every membership of `user_id`, both the
    /// running totals and the `round` bucket
    async fn apply_membership_deltas(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        round: u32,
        points_delta: i32,
        live_delta: i32,
    ) -> Result<u64, StoreError> {
        let memberships = sqlx::query(
            r#"
            UPDATE tournament_members
            SET points = points + $2,
                live_points = live_points + $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(points_delta)
        .bind(live_delta)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO tournament_member_round_points (tournament_id, user_id, round, points, live_points, updated_at)
            SELECT tournament_id, user_id, $2, $3, $4, NOW()
            FROM tournament_members
            WHERE user_id = $1
            ON CONFLICT (tournament_id, user_id, round) DO UPDATE SET
                points = tournament_member_round_points.points + EXCLUDED.points,
                live_points = tournament_member_round_points.live_points + EXCLUDED.live_points,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(round as i32)
        .bind(points_delta)
        .bind(live_delta)
        .execute(&mut **tx)
        .await?;

        Ok(memberships)
    }
}

#[async_trait]
impl PredictionStore for PredictionQueries {
    async fn predictions_for_matches(&self, match_ids: &[String]) -> Result<Vec<Prediction>, StoreError> {
        if match_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PredictionRow>(
            r#"
            SELECT id, match_id, user_id, home_score, away_score, scorer_home, scorer_away,
                   processed, live_points, created_at
            FROM predictions
            WHERE match_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(match_ids)
        .fetch_all(&self.pool)
        .await?;

        debug!("Loaded {} predictions for {} matches", rows.len(), match_ids.len());
        Ok(rows.into_iter().map(Prediction::from).collect())
    }

    async fn settle_final(
        &self,
        prediction_id: Uuid,
        round: u32,
        points: i32,
    ) -> Result<SettlementWrite, StoreError> {
        let mut tx = self.pool.begin().await?;

        let locked = Self::lock_prediction(&mut tx, prediction_id).await?;
        if locked.processed {
            tx.rollback().await?;
            return Ok(SettlementWrite::AlreadyProcessed);
        }

        sqlx::query(
            r#"
            UPDATE predictions
            SET processed = TRUE, live_points = 0, updated_at = NOW()
            WHERE id = $1 AND processed = FALSE
            "#,
        )
        .bind(prediction_id)
        .execute(&mut *tx)
        .await?;

        let memberships =
            Self::apply_membership_deltas(&mut tx, locked.user_id, round, points, -locked.live_points).await?;

        tx.commit().await?;

        info!(
            "Settled prediction {} for user {}: +{} final, -{} live across {} memberships",
            prediction_id, locked.user_id, points, locked.live_points, memberships
        );
        Ok(SettlementWrite::Applied { delta: points, memberships })
    }

    async fn apply_live(
        &self,
        prediction_id: Uuid,
        round: u32,
        live_points: i32,
    ) -> Result<SettlementWrite, StoreError> {
        let mut tx = self.pool.begin().await?;

        let locked = Self::lock_prediction(&mut tx, prediction_id).await?;
        if locked.processed {
            tx.rollback().await?;
            return Ok(SettlementWrite::AlreadyProcessed);
        }

        let delta = live_points - locked.live_points;
        if delta == 0 {
            tx.rollback().await?;
            return Ok(SettlementWrite::Unchanged);
        }

        sqlx::query("UPDATE predictions SET live_points = $2, updated_at = NOW() WHERE id = $1")
            .bind(prediction_id)
            .bind(live_points)
            .execute(&mut *tx)
            .await?;

        let memberships = Self::apply_membership_deltas(&mut tx, locked.user_id, round, 0, delta).await?;

        tx.commit().await?;

        debug!(
            "Live points for prediction {} moved {} -> {} ({} memberships)",
            prediction_id, locked.live_points, live_points, memberships
        );
        Ok(SettlementWrite::Applied { delta, memberships })
    }

    async fn clear_round_live_points(&self, round: u32, match_ids: &[String]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let reset = sqlx::query(
            r#"
            UPDATE predictions
            SET live_points = 0, updated_at = NOW()
            WHERE match_id = ANY($1) AND processed = FALSE AND live_points <> 0
            "#,
        )
        .bind(match_ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            r#"
            UPDATE tournament_member_round_points
            SET live_points = 0, updated_at = NOW()
            WHERE round = $1 AND live_points <> 0
            "#,
        )
        .bind(round as i32)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE tournament_members m
            SET live_points = COALESCE((
                SELECT SUM(r.live_points)
                FROM tournament_member_round_points r
                WHERE r.tournament_id = m.tournament_id AND r.user_id = m.user_id
            ), 0)
            "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if reset > 0 {
            info!("Cleared residual live points on {} predictions of round {}", reset, round);
        }
        Ok(reset)
    }
}
