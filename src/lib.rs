use chrono_tz::Tz;
use sqlx::PgPool;
use std::sync::Arc;

pub mod config;
pub mod db;
pub mod game;
pub mod models;
pub mod services;
pub mod telemetry;

use crate::config::Settings;
use crate::db::{ExecutionQueries, PointsQueries, PredictionQueries, RoundConfigQueries};
use crate::db::{ExecutionStore, PointsStore, PredictionStore, RoundConfigStore};
use crate::services::{
    ErrorReporter, ExecutionLedger, MatchProvider, PredictionCache, RoundStateService,
    SchedulerDependencies, SchedulerService, ScoringService, TaskRegistry, TournamentService,
    TracingErrorReporter,
};

/// Every long-lived service, wired once at startup
pub struct Engine {
    pub round_state: Arc<RoundStateService>,
    pub cache: Arc<PredictionCache>,
    pub scoring: Arc<ScoringService>,
    pub tournaments: Arc<TournamentService>,
    pub ledger: Arc<ExecutionLedger>,
    pub scheduler: Arc<SchedulerService>,
}

/// Collaborators behind the engine's seams
pub struct EngineParts {
    pub provider: Arc<dyn MatchProvider>,
    pub round_config: Arc<dyn RoundConfigStore>,
    pub predictions: Arc<dyn PredictionStore>,
    pub points: Arc<dyn PointsStore>,
    pub executions: Arc<dyn ExecutionStore>,
    pub registry: Arc<dyn TaskRegistry>,
    pub reporter: Arc<dyn ErrorReporter>,
}

impl EngineParts {
    /// Postgres-backed stores plus the tracing error sink
    pub fn with_postgres(
        pool: PgPool,
        provider: Arc<dyn MatchProvider>,
        registry: Arc<dyn TaskRegistry>,
    ) -> Self {
        Self {
            provider,
            round_config: Arc::new(RoundConfigQueries::new(pool.clone())),
            predictions: Arc::new(PredictionQueries::new(pool.clone())),
            points: Arc::new(PointsQueries::new(pool.clone())),
            executions: Arc::new(ExecutionQueries::new(pool)),
            registry,
            reporter: Arc::new(TracingErrorReporter),
        }
    }
}

pub fn build_engine(settings: &Settings, timezone: Tz, parts: EngineParts) -> Engine {
    let max_rounds = settings.provider.max_rounds;

    let round_state = Arc::new(RoundStateService::new(
        parts.provider.clone(),
        parts.reporter.clone(),
        max_rounds,
    ));
    let cache = Arc::new(PredictionCache::new(
        parts.provider.clone(),
        parts.predictions.clone(),
        parts.reporter.clone(),
        max_rounds,
    ));
    let scoring = Arc::new(ScoringService::new(
        parts.provider.clone(),
        parts.round_config.clone(),
        round_state.clone(),
        cache.clone(),
        parts.predictions.clone(),
        settings.scoring,
        parts.reporter.clone(),
    ));
    let tournaments = Arc::new(TournamentService::new(
        parts.provider.clone(),
        cache.clone(),
        parts.points.clone(),
        scoring.clone(),
    ));
    let ledger = Arc::new(ExecutionLedger::new(parts.executions.clone()));

    let scheduler = Arc::new(SchedulerService::new(
        parts.registry,
        SchedulerDependencies {
            round_state: round_state.clone(),
            round_config: parts.round_config,
            scoring: scoring.clone(),
            ledger: ledger.clone(),
            reporter: parts.reporter,
        },
        settings.scheduler.clone(),
        timezone,
    ));

    Engine {
        round_state,
        cache,
        scoring,
        tournaments,
        ledger,
        scheduler,
    }
}
