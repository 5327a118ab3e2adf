pub mod error_reporter;
pub mod execution_ledger;
pub mod match_provider;
pub mod prediction_cache;
pub mod round_state_service;
pub mod scheduler;
pub mod scoring_service;
pub mod tournament_service;

pub use error_reporter::{ErrorReporter, TracingErrorReporter};
pub use execution_ledger::ExecutionLedger;
pub use match_provider::{HttpMatchProvider, MatchProvider};
pub use prediction_cache::PredictionCache;
pub use round_state_service::RoundStateService;
pub use scheduler::{CronTaskRegistry, SchedulerDependencies, SchedulerService, TaskRegistry};
pub use scoring_service::ScoringService;
pub use tournament_service::TournamentService;
