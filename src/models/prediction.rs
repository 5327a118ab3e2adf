// src/models/prediction.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::match_data::Scores;

/// Optional scorer picks, one per side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PredictedScorers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away: Option<String>,
}

impl PredictedScorers {
    pub fn is_empty(&self) -> bool {
        self.home.is_none() && self.away.is_none()
    }
}

/// A user's predicted result for one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,
    pub match_id: String,
    pub user_id: Uuid,
    pub scores: Scores,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorers: Option<PredictedScorers>,
    /// True once final points have been committed
    pub processed: bool,
    /// Provisional points currently credited; zeroed on final commit
    pub live_points: i32,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `predictions` table
#[derive(Debug, Clone, FromRow)]
pub struct PredictionRow {
    pub id: Uuid,
    pub match_id: String,
    pub user_id: Uuid,
    pub home_score: i32,
    pub away_score: i32,
    pub scorer_home: Option<String>,
    pub scorer_away: Option<String>,
    pub processed: bool,
    pub live_points: i32,
    pub created_at: DateTime<Utc>,
}

impl From<PredictionRow> for Prediction {
    fn from(row: PredictionRow) -> Self {
        let scorers = PredictedScorers {
            home: row.scorer_home,
            away: row.scorer_away,
        };
        Prediction {
            id: row.id,
            match_id: row.match_id,
            user_id: row.user_id,
            scores: [row.home_score, row.away_score],
            scorers: if scorers.is_empty() { None } else { Some(scorers) },
            processed: row.processed,
            live_points: row.live_points,
            created_at: row.created_at,
        }
    }
}
