use chrono::{Duration, Utc};
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::db::store::{ExecutionStore, StoreError};
use crate::models::execution::{ExecutionOutcome, ExecutionRecord, ExecutionStatus, JobKind};
use crate::services::error_reporter::error_chain;

/// A ledger entry opened at job start, closed with `complete` or `fail`
#[derive(Debug)]
pub struct RunningExecution {
    record: ExecutionRecord,
    started: Instant,
}

impl RunningExecution {
    pub fn id(&self) -> uuid::Uuid {
        self.record.id
    }

    pub fn job_name(&self) -> &str {
        &self.record.job_name
    }
}

/// Audit trail of scheduled runs. Ledger writes never fail the job they
/// describe; a write failure is logged and the run carries on.
pub struct ExecutionLedger {
    store: Arc<dyn ExecutionStore>,
}

impl ExecutionLedger {
    pub fn new(store: Arc<dyn ExecutionStore>) -> Self {
        Self { store }
    }

    pub async fn open(&self, job: JobKind, previous_value: Option<serde_json::Value>) -> RunningExecution {
        let record = ExecutionRecord::started(job, previous_value);
        if let Err(e) = self.store.insert_execution(&record).await {
            warn!("⚠️ Failed to record start of {} run {}: {}", job, record.id, e);
        }
        RunningExecution { record, started: Instant::now() }
    }

    pub async fn complete(&self, run: RunningExecution, outcome: ExecutionOutcome) -> ExecutionRecord {
        let mut record = Self::close(run, ExecutionStatus::Completed);
        record.new_value = outcome.new_value;
        record.records_affected = outcome.records_affected;
        record.metadata = outcome.metadata;

        info!(
            "✅ {} run {} completed in {}ms ({} records affected)",
            record.job_name,
            record.id,
            record.duration_ms.unwrap_or_default(),
            record.records_affected
        );
        self.persist(&record).await;
        record
    }

    /// Closes the run as failed, keeping the message and the error chain
    pub async fn fail(&self, run: RunningExecution, error: &(dyn Error + Send + Sync + 'static)) -> ExecutionRecord {
        let mut record = Self::close(run, ExecutionStatus::Failed);
        record.error_message = Some(error.to_string());
        record.metadata = serde_json::json!({ "error_chain": error_chain(error) });

        warn!(
            "❌ {} run {} failed after {}ms: {}",
            record.job_name,
            record.id,
            record.duration_ms.unwrap_or_default(),
            error
        );
        self.persist(&record).await;
        record
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<ExecutionRecord>, StoreError> {
        self.store.recent_executions(limit).await
    }

    /// Deletes records that started more than `retention_days` ago
    pub async fn purge_older_than(&self, retention_days: i64) -> Result<u64, StoreError> {
        let cutoff = Utc::now() - Duration::days(retention_days);
        self.store.delete_executions_before(cutoff).await
    }

    fn close(run: RunningExecution, status: ExecutionStatus) -> ExecutionRecord {
        let mut record = run.record;
        record.status = status;
        record.finished_at = Some(Utc::now());
        record.duration_ms = Some(run.started.elapsed().as_millis() as i64);
        record
    }

    async fn persist(&self, record: &ExecutionRecord) {
        if let Err(e) = self.store.update_execution(record).await {
            warn!("⚠️ Failed to record end of {} run {}: {}", record.job_name, record.id, e);
        }
    }
}
