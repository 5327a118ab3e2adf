use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::store::{PredictionStore, RoundConfigStore, SettlementWrite, StoreError};
use crate::game::kickoff::kicks_off_on;
use crate::game::points::PointsConfiguration;
use crate::models::match_data::{Match, MatchStatus, Scores};
use crate::models::prediction::Prediction;
use crate::services::error_reporter::ErrorReporter;
use crate::services::match_provider::{MatchProvider, ProviderError};
use crate::services::prediction_cache::{CacheError, PredictionCache};
use crate::services::round_state_service::RoundStateService;

/// Score assumed for a live match the provider has not scored yet
const KICKOFF_SCORES: Scores = [0, 0];

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("finished match {match_id} has no final score")]
    MissingFinalScore { match_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementKind {
    Final,
    Live,
}

/// One points movement applied during a sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointsDetail {
    pub user_id: Uuid,
    pub prediction_id: Uuid,
    pub match_id: String,
    pub kind: SettlementKind,
    /// Final points, or the new provisional value
    pub points: i32,
    /// What actually moved on the membership totals
    pub delta: i32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessRoundResult {
    pub round: u32,
    pub final_count: usize,
    pub live_count: usize,
    pub live_reset_count: u64,
    pub failed_predictions: usize,
    pub failed_matches: usize,
    pub details: Vec<PointsDetail>,
}

/// Turns match results into competition points. Final settlement is
/// idempotent per prediction; live settlement only ever applies differences.
pub struct ScoringService {
    provider: Arc<dyn MatchProvider>,
    round_config: Arc<dyn RoundConfigStore>,
    round_state: Arc<RoundStateService>,
    cache: Arc<PredictionCache>,
    predictions: Arc<dyn PredictionStore>,
    points: PointsConfiguration,
    reporter: Arc<dyn ErrorReporter>,
}

impl ScoringService {
    pub fn new(
        provider: Arc<dyn MatchProvider>,
        round_config: Arc<dyn RoundConfigStore>,
        round_state: Arc<RoundStateService>,
        cache: Arc<PredictionCache>,
        predictions: Arc<dyn PredictionStore>,
        points: PointsConfiguration,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            provider,
            round_config,
            round_state,
            cache,
            predictions,
            points,
            reporter,
        }
    }

    pub fn points_configuration(&self) -> &PointsConfiguration {
        &self.points
    }

    /// The committed current round, or a fresh calculation when none has been
    /// committed yet
    pub async fn resolve_round(&self) -> Result<u32, ScoringError> {
        match self.round_config.get_current_round().await? {
            Some(config) => Ok(config.round),
            None => {
                let round = self.round_state.calculate_current_round().await;
                info!("No current round committed yet, calculated round {}", round);
                Ok(round)
            }
        }
    }

    /// One sweep over the current round
    pub async fn process_round(&self) -> Result<ProcessRoundResult, ScoringError> {
        let round = self.resolve_round().await?;
        info!("🎯 Processing round {}", round);

        let matches = self.provider.fetch_round(round).await?;
        let predictions = self.cache.get(round).await?;

        let mut result = ProcessRoundResult {
            round,
            ..ProcessRoundResult::default()
        };
        let mut touched: Vec<String> = Vec::new();

        for fixture in &matches {
            let Some(list) = predictions.get(&fixture.id) else {
                continue;
            };

            let changed = match fixture.status {
                MatchStatus::Finished => match fixture.scores {
                    Some(scores) => self.settle_final_match(round, fixture, &scores, list, &mut result).await,
                    None => {
                        let e = ScoringError::MissingFinalScore { match_id: fixture.id.clone() };
                        warn!("⚠️ Skipping match {}: {}", fixture.id, e);
                        self.reporter.report_error("scoring.match", json!({ "round": round, "match_id": fixture.id }), &e);
                        result.failed_matches += 1;
                        false
                    }
                },
                MatchStatus::Live => {
                    let scores = fixture.scores.unwrap_or(KICKOFF_SCORES);
                    self.settle_live_match(round, fixture, &scores, list, &mut result).await
                }
                MatchStatus::Scheduled => false,
            };

            if changed {
                touched.push(fixture.id.clone());
            }
        }

        let reset = if matches.iter().any(Match::is_live) {
            Ok(0)
        } else {
            let match_ids: Vec<String> = matches.iter().map(|m| m.id.clone()).collect();
            self.predictions.clear_round_live_points(round, &match_ids).await
        };

        match reset {
            Ok(count) => {
                if count > 0 {
                    touched.extend(matches.iter().map(|m| m.id.clone()));
                }
                result.live_reset_count = count;
            }
            Err(e) => {
                // Cached predictions changed even though the reset failed
                self.invalidate(&mut touched).await;
                return Err(e.into());
            }
        }

        self.invalidate(&mut touched).await;

        info!(
            "✅ Round {} processed: {} final, {} live, {} live resets, {} failed predictions",
            round, result.final_count, result.live_count, result.live_reset_count, result.failed_predictions
        );
        Ok(result)
    }

    /// Whether any match of the current or the following round kicks off on
    /// `date` (tournament-local)
    pub async fn has_matches_on(&self, date: NaiveDate) -> Result<bool, ScoringError> {
        let round = self.resolve_round().await?;
        let lookahead = (round + 1).min(self.round_state.max_rounds()).max(round);

        for candidate in round..=lookahead {
            match self.provider.fetch_round(candidate).await {
                Ok(matches) => {
                    if matches.iter().any(|m| kicks_off_on(m, date)) {
                        debug!("Round {} has matches on {}", candidate, date);
                        return Ok(true);
                    }
                }
                Err(e) if candidate == round => return Err(e.into()),
                Err(e) => {
                    warn!("⚠️ Could not check round {} for matches on {}: {}", candidate, date, e);
                    self.reporter.report_error(
                        "scoring.lookahead",
                        json!({ "round": candidate, "date": date.to_string() }),
                        &e,
                    );
                }
            }
        }

        Ok(false)
    }

    async fn settle_final_match(
        &self,
        round: u32,
        fixture: &Match,
        scores: &Scores,
        predictions: &[Prediction],
        result: &mut ProcessRoundResult,
    ) -> bool {
        let mut changed = false;

        for prediction in predictions.iter().filter(|p| !p.processed) {
            let points = self.points.points_for(prediction, scores, &fixture.scorers);

            match self.predictions.settle_final(prediction.id, round, points).await {
                Ok(SettlementWrite::Applied { .. }) => {
                    result.final_count += 1;
                    result.details.push(PointsDetail {
                        user_id: prediction.user_id,
                        prediction_id: prediction.id,
                        match_id: fixture.id.clone(),
                        kind: SettlementKind::Final,
                        points,
                        delta: points,
                    });
                    changed = true;
                }
                Ok(SettlementWrite::AlreadyProcessed) | Ok(SettlementWrite::Unchanged) => {
                    debug!("Prediction {} was already settled", prediction.id);
                    changed = true;
                }
                Err(e) => {
                    error!("❌ Failed to settle prediction {} for match {}: {}", prediction.id, fixture.id, e);
                    self.reporter.report_error(
                        "scoring.final",
                        json!({ "round": round, "match_id": fixture.id, "prediction_id": prediction.id, "points": points }),
                        &e,
                    );
                    result.failed_predictions += 1;
                }
            }
        }

        changed
    }

    async fn settle_live_match(
        &self,
        round: u32,
        fixture: &Match,
        scores: &Scores,
        predictions: &[Prediction],
        result: &mut ProcessRoundResult,
    ) -> bool {
        let mut changed = false;

        for prediction in predictions.iter().filter(|p| !p.processed) {
            let live_points = self.points.points_for(prediction, scores, &fixture.scorers);
            if live_points == prediction.live_points {
                continue;
            }

            match self.predictions.apply_live(prediction.id, round, live_points).await {
                Ok(SettlementWrite::Applied { delta, .. }) => {
                    result.live_count += 1;
                    result.details.push(PointsDetail {
                        user_id: prediction.user_id,
                        prediction_id: prediction.id,
                        match_id: fixture.id.clone(),
                        kind: SettlementKind::Live,
                        points: live_points,
                        delta,
                    });
                    changed = true;
                }
                Ok(SettlementWrite::AlreadyProcessed) | Ok(SettlementWrite::Unchanged) => {
                    debug!("Prediction {} live value already current", prediction.id);
                    changed = true;
                }
                Err(e) => {
                    error!("❌ Failed to apply live points to prediction {} for match {}: {}", prediction.id, fixture.id, e);
                    self.reporter.report_error(
                        "scoring.live",
                        json!({ "round": round, "match_id": fixture.id, "prediction_id": prediction.id, "live_points": live_points }),
                        &e,
                    );
                    result.failed_predictions += 1;
                }
            }
        }

        changed
    }

    async fn invalidate(&self, touched: &mut Vec<String>) {
        if touched.is_empty() {
            return;
        }
        touched.sort();
        touched.dedup();
        self.cache.invalidate(touched.as_slice()).await;
    }
}
