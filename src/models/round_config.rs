// src/models/round_config.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who last wrote the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoundUpdater {
    Manual,
    CronJob,
}

impl fmt::Display for RoundUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundUpdater::Manual => write!(f, "manual"),
            RoundUpdater::CronJob => write!(f, "cron_job"),
        }
    }
}

/// Committed output of the round state calculator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentRoundConfig {
    pub round: u32,
    pub updated_at: DateTime<Utc>,
    pub updated_by: RoundUpdater,
}
