mod common;

use chrono::{Duration, Utc};
use serde_json::json;

use common::utils::spawn_engine;
use matchday_engine::models::execution::{ExecutionOutcome, ExecutionRecord, ExecutionStatus, JobKind};

#[derive(Debug, thiserror::Error)]
#[error("sweep aborted")]
struct Aborted(#[source] std::io::Error);

#[tokio::test]
async fn completed_runs_are_recorded_with_their_outcome() {
    let app = spawn_engine(16);
    let ledger = &app.engine.ledger;

    let run = ledger.open(JobKind::RecomputeRound, Some(json!({ "round": 3 }))).await;
    let started = app.store.executions();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].status, ExecutionStatus::Started);
    assert_eq!(started[0].job_name, "recompute_current_round");

    let record = ledger
        .complete(
            run,
            ExecutionOutcome {
                new_value: Some(json!({ "round": 4 })),
                records_affected: 1,
                metadata: json!({ "updated_by": "cron_job" }),
            },
        )
        .await;

    let stored = app.store.executions();
    assert_eq!(stored, vec![record.clone()]);
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.previous_value, Some(json!({ "round": 3 })));
    assert_eq!(record.new_value, Some(json!({ "round": 4 })));
    assert!(record.finished_at.is_some());
    assert!(record.duration_ms.is_some());
}

#[tokio::test]
async fn failed_runs_keep_the_error_chain() {
    let app = spawn_engine(16);
    let ledger = &app.engine.ledger;

    let run = ledger.open(JobKind::ScoringSweep, None).await;
    let error = Aborted(std::io::Error::new(std::io::ErrorKind::TimedOut, "provider stalled"));
    let record = ledger.fail(run, &error).await;

    assert_eq!(record.status, ExecutionStatus::Failed);
    assert_eq!(record.error_message.as_deref(), Some("sweep aborted"));
    let chain = record.metadata["error_chain"].as_str().unwrap();
    assert!(chain.contains("caused by: provider stalled"));
    assert_eq!(app.store.executions()[0].status, ExecutionStatus::Failed);
}

#[tokio::test]
async fn ledger_write_failures_do_not_fail_the_run() {
    let app = spawn_engine(16);
    app.store.fail_execution_writes();

    let run = app.engine.ledger.open(JobKind::LedgerPurge, None).await;
    let record = app.engine.ledger.complete(run, ExecutionOutcome::default()).await;
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert!(app.store.executions().is_empty());
}

#[tokio::test]
async fn recent_runs_come_newest_first() {
    let app = spawn_engine(16);
    for minutes_ago in [30, 10, 20] {
        let mut record = ExecutionRecord::started(JobKind::ScoringSweep, None);
        record.started_at = Utc::now() - Duration::minutes(minutes_ago);
        app.store.push_execution(record);
    }

    let recent = app.engine.ledger.recent(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent[0].started_at > recent[1].started_at);
}

#[tokio::test]
async fn purge_deletes_only_records_past_retention() {
    let app = spawn_engine(16);
    let mut old = ExecutionRecord::started(JobKind::ScoringSweep, None);
    old.started_at = Utc::now() - Duration::days(45);
    app.store.push_execution(old);
    app.store.push_execution(ExecutionRecord::started(JobKind::ScoringSweep, None));

    assert_eq!(app.engine.ledger.purge_older_than(30).await.unwrap(), 1);
    assert_eq!(app.store.executions().len(), 1);
}
