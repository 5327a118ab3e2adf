pub mod execution_queries;
pub mod points_queries;
pub mod prediction_queries;
pub mod round_config_queries;
pub mod store;

pub use execution_queries::ExecutionQueries;
pub use points_queries::PointsQueries;
pub use prediction_queries::PredictionQueries;
pub use round_config_queries::RoundConfigQueries;
pub use store::{ExecutionStore, PointsStore, PredictionStore, RoundConfigStore, SettlementWrite, StoreError};
