//! Persistent store operations consumed by the engine.
//!
//! The Postgres implementations live next to this module (`*_queries.rs`);
//! anything else that satisfies these traits (e.g. an in-memory double) can
//! be injected instead.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::execution::ExecutionRecord;
use crate::models::points::{MembershipPoints, RoundPoints};
use crate::models::prediction::Prediction;
use crate::models::round_config::{CurrentRoundConfig, RoundUpdater};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a settlement write for one prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementWrite {
    /// Points were applied; `delta` is what moved on every membership
    Applied { delta: i32, memberships: u64 },
    /// The prediction was already processed, nothing changed
    AlreadyProcessed,
    /// The live value was already current, nothing changed
    Unchanged,
}

#[async_trait]
pub trait RoundConfigStore: Send + Sync {
    async fn get_current_round(&self) -> Result<Option<CurrentRoundConfig>, StoreError>;

    async fn set_current_round(
        &self,
        round: u32,
        updated_by: RoundUpdater,
    ) -> Result<CurrentRoundConfig, StoreError>;
}

#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Bulk read of every prediction whose match id is in `match_ids`,
    /// ordered by submission time
    async fn predictions_for_matches(&self, match_ids: &[String]) -> Result<Vec<Prediction>, StoreError>;

    /// Commits final points for an unprocessed prediction in one transaction:
    /// adds `points` to every membership of the user (running total and the
    /// `round` bucket), removes the prediction's live points from the live
    /// totals, marks it processed and zeroes its live points.
    async fn settle_final(
        &self,
        prediction_id: Uuid,
        round: u32,
        points: i32,
    ) -> Result<SettlementWrite, StoreError>;

    /// Moves the prediction's stored live points to `live_points` and applies
    /// only the difference to the membership live totals. The difference is
    /// computed against the stored value, not the caller's copy.
    async fn apply_live(
        &self,
        prediction_id: Uuid,
        round: u32,
        live_points: i32,
    ) -> Result<SettlementWrite, StoreError>;

    /// Zeroes residual live points of the round's unprocessed predictions and
    /// round buckets, then recomputes every membership's live total as the sum
    /// of its stored per-round live points. Returns predictions reset.
    async fn clear_round_live_points(&self, round: u32, match_ids: &[String]) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait PointsStore: Send + Sync {
    async fn round_points(&self, tournament_id: Uuid, round: u32) -> Result<Vec<RoundPoints>, StoreError>;

    async fn membership_points(&self, tournament_id: Uuid) -> Result<Vec<MembershipPoints>, StoreError>;
}

#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn insert_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError>;

    async fn update_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError>;

    async fn recent_executions(&self, limit: i64) -> Result<Vec<ExecutionRecord>, StoreError>;

    async fn delete_executions_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}
