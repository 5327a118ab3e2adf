use futures::future::join_all;
use serde_json::json;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::db::store::{PredictionStore, StoreError};
use crate::models::prediction::Prediction;
use crate::services::error_reporter::ErrorReporter;
use crate::services::match_provider::{MatchProvider, ProviderError};

/// Rounds invalidated when the owner of a match cannot be discovered
pub const FALLBACK_INVALIDATION_ROUNDS: [u32; 3] = [1, 2, 3];

/// match id -> predictions for that match, in submission order
pub type RoundPredictions = HashMap<String, Vec<Prediction>>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

struct RoundSnapshot {
    match_ids: HashSet<String>,
    predictions: Arc<RoundPredictions>,
}

#[derive(Default)]
struct CacheState {
    rounds: HashMap<u32, RoundSnapshot>,
    /// Bumped by every invalidation so loads that raced one are discarded
    generation: u64,
}

/// Per-round prediction snapshots, filled from the store on miss and kept
/// fresh purely by write-path invalidation.
pub struct PredictionCache {
    provider: Arc<dyn MatchProvider>,
    store: Arc<dyn PredictionStore>,
    reporter: Arc<dyn ErrorReporter>,
    max_rounds: u32,
    state: RwLock<CacheState>,
}

impl PredictionCache {
    pub fn new(
        provider: Arc<dyn MatchProvider>,
        store: Arc<dyn PredictionStore>,
        reporter: Arc<dyn ErrorReporter>,
        max_rounds: u32,
    ) -> Self {
        Self {
            provider,
            store,
            reporter,
            max_rounds,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Predictions of `round` grouped by match. Every match of the round has
    /// an entry, possibly empty.
    pub async fn get(&self, round: u32) -> Result<Arc<RoundPredictions>, CacheError> {
        let generation = {
            let state = self.state.read().await;
            if let Some(snapshot) = state.rounds.get(&round) {
                debug!("Prediction cache hit for round {}", round);
                return Ok(snapshot.predictions.clone());
            }
            state.generation
        };

        debug!("Prediction cache miss for round {}", round);
        let matches = self.provider.fetch_round(round).await?;
        let match_ids: Vec<String> = matches.into_iter().map(|m| m.id).collect();

        // One bulk query for the whole round
        let predictions = self.store.predictions_for_matches(&match_ids).await?;

        let mut grouped: RoundPredictions = match_ids.iter().map(|id| (id.clone(), Vec::new())).collect();
        for prediction in predictions {
            grouped.entry(prediction.match_id.clone()).or_default().push(prediction);
        }
        for list in grouped.values_mut() {
            list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        }
        let grouped = Arc::new(grouped);

        let mut state = self.state.write().await;
        if state.generation == generation {
            state.rounds.insert(
                round,
                RoundSnapshot {
                    match_ids: match_ids.into_iter().collect(),
                    predictions: grouped.clone(),
                },
            );
        } else {
            debug!("Round {} changed while loading, not caching the snapshot", round);
        }

        Ok(grouped)
    }

    /// Drops every cached round containing any of `match_ids`. With a cold
    /// cache the owning rounds are discovered from the provider; if that
    /// finds nothing, a fixed set of early rounds is dropped instead.
    /// Returns the rounds invalidated.
    pub async fn invalidate(&self, match_ids: &[String]) -> Vec<u32> {
        if match_ids.is_empty() {
            return Vec::new();
        }
        let wanted: HashSet<&str> = match_ids.iter().map(String::as_str).collect();

        {
            let mut state = self.state.write().await;
            state.generation += 1;

            let cached: Vec<u32> = state
                .rounds
                .iter()
                .filter(|(_, snapshot)| snapshot.match_ids.iter().any(|id| wanted.contains(id.as_str())))
                .map(|(round, _)| *round)
                .collect();

            if !cached.is_empty() {
                for round in &cached {
                    state.rounds.remove(round);
                }
                info!("Invalidated prediction cache for rounds {:?}", cached);
                return sorted(cached);
            }
        }

        let discovered = self.discover_rounds(&wanted).await;
        let rounds = if discovered.is_empty() {
            warn!(
                "⚠️ Could not find the round of matches {:?}, invalidating rounds {:?}",
                match_ids, FALLBACK_INVALIDATION_ROUNDS
            );
            FALLBACK_INVALIDATION_ROUNDS.to_vec()
        } else {
            discovered
        };

        let mut state = self.state.write().await;
        state.generation += 1;
        for round in &rounds {
            state.rounds.remove(round);
        }
        info!("Invalidated prediction cache for rounds {:?}", rounds);
        sorted(rounds)
    }

    pub async fn invalidate_all(&self) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.rounds.clear();
        info!("Invalidated the whole prediction cache");
    }

    pub async fn cached_rounds(&self) -> Vec<u32> {
        let state = self.state.read().await;
        sorted(state.rounds.keys().copied().collect())
    }

    /// Probes every round against the provider. Failed fetches are reported
    /// and otherwise ignored.
    async fn discover_rounds(&self, wanted: &HashSet<&str>) -> Vec<u32> {
        let probes = (1..=self.max_rounds).map(|round| async move {
            (round, self.provider.fetch_round(round).await)
        });

        join_all(probes)
            .await
            .into_iter()
            .filter_map(|(round, result)| match result {
                Ok(matches) if matches.iter().any(|m| wanted.contains(m.id.as_str())) => Some(round),
                Ok(_) => None,
                Err(e) => {
                    debug!("Probe of round {} failed: {}", round, e);
                    self.reporter.report_error("prediction_cache.discover", json!({ "round": round }), &e);
                    None
                }
            })
            .collect()
    }
}

fn sorted(rounds: Vec<u32>) -> Vec<u32> {
    rounds.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}
