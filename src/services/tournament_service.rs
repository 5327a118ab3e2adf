use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::db::store::{PointsStore, StoreError};
use crate::game::ranking::{rank_round, rank_tournament};
use crate::models::ranking::{MatchOverview, MatchdayOverview, RankingEntry};
use crate::services::match_provider::{MatchProvider, ProviderError};
use crate::services::prediction_cache::{CacheError, PredictionCache};
use crate::services::scoring_service::{ScoringError, ScoringService};

#[derive(Debug, Error)]
pub enum TournamentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Read side for clients: current round, matchday data and rankings, plus
/// the invalidation hook for prediction writes.
pub struct TournamentService {
    provider: Arc<dyn MatchProvider>,
    cache: Arc<PredictionCache>,
    points: Arc<dyn PointsStore>,
    scoring: Arc<ScoringService>,
}

impl TournamentService {
    pub fn new(
        provider: Arc<dyn MatchProvider>,
        cache: Arc<PredictionCache>,
        points: Arc<dyn PointsStore>,
        scoring: Arc<ScoringService>,
    ) -> Self {
        Self { provider, cache, points, scoring }
    }

    pub async fn current_round(&self) -> Result<u32, TournamentError> {
        Ok(self.scoring.resolve_round().await?)
    }

    /// Provider matches of `round` with how many predictions each one has
    pub async fn matchday(&self, round: u32) -> Result<MatchdayOverview, TournamentError> {
        let fixtures = self.provider.fetch_round(round).await?;
        let predictions = self.cache.get(round).await?;

        let matches: Vec<MatchOverview> = fixtures
            .into_iter()
            .map(|fixture| {
                let prediction_count = predictions.get(&fixture.id).map_or(0, Vec::len);
                MatchOverview { fixture, prediction_count }
            })
            .collect();
        let total_predictions = matches.iter().map(|m| m.prediction_count).sum();

        Ok(MatchdayOverview { round, matches, total_predictions })
    }

    /// Ranking of one round, ties going to whoever predicted first in it
    pub async fn round_ranking(&self, tournament_id: Uuid, round: u32) -> Result<Vec<RankingEntry>, TournamentError> {
        let rows = self.points.round_points(tournament_id, round).await?;
        let predictions = self.cache.get(round).await?;

        let mut first_submissions: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
        for prediction in predictions.values().flatten() {
            first_submissions
                .entry(prediction.user_id)
                .and_modify(|at| *at = (*at).min(prediction.created_at))
                .or_insert(prediction.created_at);
        }

        Ok(rank_round(&rows, &first_submissions))
    }

    pub async fn tournament_ranking(&self, tournament_id: Uuid) -> Result<Vec<RankingEntry>, TournamentError> {
        let rows = self.points.membership_points(tournament_id).await?;
        Ok(rank_tournament(&rows))
    }

    /// Called after predictions of these matches were created, edited or
    /// deleted. Returns the rounds dropped from the cache.
    pub async fn predictions_changed(&self, match_ids: &[String]) -> Vec<u32> {
        self.cache.invalidate(match_ids).await
    }

    pub async fn invalidate_all(&self) {
        info!("Dropping every cached round on request");
        self.cache.invalidate_all().await;
    }
}
