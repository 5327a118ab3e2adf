// src/models/ranking.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::match_data::Match;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub position: usize,
    pub user_id: Uuid,
    pub points: i32,
    pub live_points: i32,
    pub total: i32,
    /// Earliest submission (round ranking) or join time (tournament ranking)
    pub tiebreak_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchOverview {
    #[serde(flatten)]
    pub fixture: Match,
    pub prediction_count: usize,
}

/// Provider matchday data enriched with prediction counts
#[derive(Debug, Clone, Serialize)]
pub struct MatchdayOverview {
    pub round: u32,
    pub matches: Vec<MatchOverview>,
    pub total_predictions: usize,
}
