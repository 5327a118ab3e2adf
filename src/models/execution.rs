// src/models/execution.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Started,
    Completed,
    Failed,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Started => write!(f, "started"),
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Every job the scheduler knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    RecomputeRound,
    ProbeMatchesToday,
    ScoringSweep,
    SweepLifecycle,
    LedgerPurge,
}

impl JobKind {
    pub const ALL: [JobKind; 5] = [
        JobKind::RecomputeRound,
        JobKind::ProbeMatchesToday,
        JobKind::ScoringSweep,
        JobKind::SweepLifecycle,
        JobKind::LedgerPurge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::RecomputeRound => "recompute_current_round",
            JobKind::ProbeMatchesToday => "probe_matches_today",
            JobKind::ScoringSweep => "scoring_sweep",
            JobKind::SweepLifecycle => "sweep_lifecycle",
            JobKind::LedgerPurge => "purge_execution_ledger",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the execution ledger. Created when a run starts and updated
/// exactly once when it ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub job_name: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub previous_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub records_affected: i64,
    pub metadata: serde_json::Value,
    pub error_message: Option<String>,
}

impl ExecutionRecord {
    pub fn started(job: JobKind, previous_value: Option<serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_name: job.as_str().to_string(),
            status: ExecutionStatus::Started,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: None,
            previous_value,
            new_value: None,
            records_affected: 0,
            metadata: serde_json::json!({}),
            error_message: None,
        }
    }
}

/// What a successful run reports back to the ledger
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    pub new_value: Option<serde_json::Value>,
    pub records_affected: i64,
    pub metadata: serde_json::Value,
}
