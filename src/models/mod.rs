pub mod execution;
pub mod match_data;
pub mod points;
pub mod prediction;
pub mod ranking;
pub mod round_config;
