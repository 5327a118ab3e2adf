// src/models/points.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Running totals of one user inside one tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MembershipPoints {
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub points: i32,
    pub live_points: i32,
    pub joined_at: DateTime<Utc>,
}

/// Per-round bucket of one membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPoints {
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub round: u32,
    pub points: i32,
    pub live_points: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct RoundPointsRow {
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub round: i32,
    pub points: i32,
    pub live_points: i32,
}

impl From<RoundPointsRow> for RoundPoints {
    fn from(row: RoundPointsRow) -> Self {
        RoundPoints {
            tournament_id: row.tournament_id,
            user_id: row.user_id,
            round: row.round.max(0) as u32,
            points: row.points,
            live_points: row.live_points,
        }
    }
}
