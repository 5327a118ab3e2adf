use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::sync::Mutex;
use tokio_cron_scheduler::{Job, JobSchedulerError};
use uuid::Uuid;

use matchday_engine::db::store::{
    ExecutionStore, PointsStore, PredictionStore, RoundConfigStore, SettlementWrite, StoreError,
};
use matchday_engine::models::execution::ExecutionRecord;
use matchday_engine::models::match_data::Match;
use matchday_engine::models::points::{MembershipPoints, RoundPoints};
use matchday_engine::models::prediction::Prediction;
use matchday_engine::models::round_config::{CurrentRoundConfig, RoundUpdater};
use matchday_engine::services::error_reporter::{error_chain, ErrorReporter};
use matchday_engine::services::match_provider::{MatchProvider, ProviderError};
use matchday_engine::services::scheduler::TaskRegistry;

/// Serves rounds from memory. Unknown rounds come back empty.
#[derive(Default)]
pub struct FakeProvider {
    rounds: Mutex<HashMap<u32, Vec<Match>>>,
    /// round -> remaining failures; `u32::MAX` fails forever
    failures: Mutex<HashMap<u32, u32>>,
    calls: Mutex<Vec<u32>>,
}

impl FakeProvider {
    pub fn set_round(&self, round: u32, matches: Vec<Match>) {
        self.rounds.lock().unwrap().insert(round, matches);
    }

    pub fn update_match(&self, match_id: &str, update: impl FnOnce(&mut Match)) {
        let mut rounds = self.rounds.lock().unwrap();
        let fixture = rounds
            .values_mut()
            .flat_map(|matches| matches.iter_mut())
            .find(|m| m.id == match_id)
            .expect("unknown match id");
        update(fixture);
    }

    pub fn fail_round(&self, round: u32) {
        self.failures.lock().unwrap().insert(round, u32::MAX);
    }

    pub fn fail_round_times(&self, round: u32, times: u32) {
        self.failures.lock().unwrap().insert(round, times);
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, round: u32) -> usize {
        self.calls.lock().unwrap().iter().filter(|r| **r == round).count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl MatchProvider for FakeProvider {
    async fn fetch_round(&self, round: u32) -> Result<Vec<Match>, ProviderError> {
        self.calls.lock().unwrap().push(round);

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&round) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Err(ProviderError::Status { round, status: 503 });
                }
            }
        }

        Ok(self.rounds.lock().unwrap().get(&round).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MemoryState {
    pub current_round: Option<CurrentRoundConfig>,
    pub predictions: HashMap<Uuid, Prediction>,
    pub members: Vec<MembershipPoints>,
    pub round_points: HashMap<(Uuid, Uuid, u32), RoundPoints>,
    pub executions: Vec<ExecutionRecord>,
    pub failing_predictions: HashSet<Uuid>,
    pub fail_round_config_writes: bool,
    pub fail_execution_writes: bool,
}

impl MemoryState {
    fn apply_membership_deltas(&mut self, user_id: Uuid, round: u32, points: i32, live: i32) -> u64 {
        let mut memberships = 0;
        for member in self.members.iter_mut().filter(|m| m.user_id == user_id) {
            member.points += points;
            member.live_points += live;
            memberships += 1;

            let bucket = self
                .round_points
                .entry((member.tournament_id, user_id, round))
                .or_insert_with(|| RoundPoints {
                    tournament_id: member.tournament_id,
                    user_id,
                    round,
                    points: 0,
                    live_points: 0,
                });
            bucket.points += points;
            bucket.live_points += live;
        }
        memberships
    }
}

/// Every store trait over one mutex-guarded state, with the same write
/// semantics as the Postgres queries
#[derive(Default)]
pub struct MemoryStore {
    pub state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn add_member(&self, tournament_id: Uuid, user_id: Uuid, joined_at: DateTime<Utc>) {
        self.state.lock().unwrap().members.push(MembershipPoints {
            tournament_id,
            user_id,
            points: 0,
            live_points: 0,
            joined_at,
        });
    }

    pub fn add_prediction(&self, prediction: Prediction) -> Uuid {
        let id = prediction.id;
        self.state.lock().unwrap().predictions.insert(id, prediction);
        id
    }

    pub fn prediction(&self, id: Uuid) -> Prediction {
        self.state.lock().unwrap().predictions.get(&id).cloned().expect("unknown prediction")
    }

    pub fn member(&self, tournament_id: Uuid, user_id: Uuid) -> MembershipPoints {
        self.state
            .lock()
            .unwrap()
            .members
            .iter()
            .find(|m| m.tournament_id == tournament_id && m.user_id == user_id)
            .cloned()
            .expect("unknown member")
    }

    pub fn round_bucket(&self, tournament_id: Uuid, user_id: Uuid, round: u32) -> Option<RoundPoints> {
        self.state
            .lock()
            .unwrap()
            .round_points
            .get(&(tournament_id, user_id, round))
            .cloned()
    }

    pub fn set_round(&self, round: u32) {
        self.state.lock().unwrap().current_round = Some(CurrentRoundConfig {
            round,
            updated_at: Utc::now(),
            updated_by: RoundUpdater::Manual,
        });
    }

    pub fn current_round(&self) -> Option<CurrentRoundConfig> {
        self.state.lock().unwrap().current_round.clone()
    }

    pub fn executions(&self) -> Vec<ExecutionRecord> {
        self.state.lock().unwrap().executions.clone()
    }

    pub fn executions_named(&self, job_name: &str) -> Vec<ExecutionRecord> {
        self.executions().into_iter().filter(|r| r.job_name == job_name).collect()
    }

    pub fn push_execution(&self, record: ExecutionRecord) {
        self.state.lock().unwrap().executions.push(record);
    }

    pub fn fail_prediction_writes(&self, prediction_id: Uuid) {
        self.state.lock().unwrap().failing_predictions.insert(prediction_id);
    }

    pub fn fail_round_config_writes(&self) {
        self.state.lock().unwrap().fail_round_config_writes = true;
    }

    pub fn fail_execution_writes(&self) {
        self.state.lock().unwrap().fail_execution_writes = true;
    }
}

fn unavailable(what: &str) -> StoreError {
    StoreError::Unavailable(format!("{} write rejected", what))
}

#[async_trait]
impl RoundConfigStore for MemoryStore {
    async fn get_current_round(&self) -> Result<Option<CurrentRoundConfig>, StoreError> {
        Ok(self.current_round())
    }

    async fn set_current_round(&self, round: u32, updated_by: RoundUpdater) -> Result<CurrentRoundConfig, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_round_config_writes {
            return Err(unavailable("round config"));
        }
        let config = CurrentRoundConfig {
            round,
            updated_at: Utc::now(),
            updated_by,
        };
        state.current_round = Some(config.clone());
        Ok(config)
    }
}

#[async_trait]
impl PredictionStore for MemoryStore {
    async fn predictions_for_matches(&self, match_ids: &[String]) -> Result<Vec<Prediction>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut predictions: Vec<Prediction> = state
            .predictions
            .values()
            .filter(|p| match_ids.contains(&p.match_id))
            .cloned()
            .collect();
        predictions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(predictions)
    }

    async fn settle_final(&self, prediction_id: Uuid, round: u32, points: i32) -> Result<SettlementWrite, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_predictions.contains(&prediction_id) {
            return Err(unavailable("prediction"));
        }
        let prediction = state.predictions.get_mut(&prediction_id).ok_or_else(|| StoreError::NotFound {
            entity: "prediction",
            id: prediction_id.to_string(),
        })?;
        if prediction.processed {
            return Ok(SettlementWrite::AlreadyProcessed);
        }

        let user_id = prediction.user_id;
        let live = prediction.live_points;
        prediction.processed = true;
        prediction.live_points = 0;

        let memberships = state.apply_membership_deltas(user_id, round, points, -live);
        Ok(SettlementWrite::Applied { delta: points, memberships })
    }

    async fn apply_live(&self, prediction_id: Uuid, round: u32, live_points: i32) -> Result<SettlementWrite, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_predictions.contains(&prediction_id) {
            return Err(unavailable("prediction"));
        }
        let prediction = state.predictions.get_mut(&prediction_id).ok_or_else(|| StoreError::NotFound {
            entity: "prediction",
            id: prediction_id.to_string(),
        })?;
        if prediction.processed {
            return Ok(SettlementWrite::AlreadyProcessed);
        }

        let delta = live_points - prediction.live_points;
        if delta == 0 {
            return Ok(SettlementWrite::Unchanged);
        }
        let user_id = prediction.user_id;
        prediction.live_points = live_points;

        let memberships = state.apply_membership_deltas(user_id, round, 0, delta);
        Ok(SettlementWrite::Applied { delta, memberships })
    }

    async fn clear_round_live_points(&self, round: u32, match_ids: &[String]) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap();

        let mut reset = 0;
        for prediction in state.predictions.values_mut() {
            if match_ids.contains(&prediction.match_id) && !prediction.processed && prediction.live_points != 0 {
                prediction.live_points = 0;
                reset += 1;
            }
        }

        for bucket in state.round_points.values_mut().filter(|b| b.round == round) {
            bucket.live_points = 0;
        }

        let totals: HashMap<(Uuid, Uuid), i32> =
            state.round_points.values().fold(HashMap::new(), |mut totals, bucket| {
                *totals.entry((bucket.tournament_id, bucket.user_id)).or_insert(0) += bucket.live_points;
                totals
            });
        for member in state.members.iter_mut() {
            member.live_points = totals.get(&(member.tournament_id, member.user_id)).copied().unwrap_or(0);
        }

        Ok(reset)
    }
}

#[async_trait]
impl PointsStore for MemoryStore {
    async fn round_points(&self, tournament_id: Uuid, round: u32) -> Result<Vec<RoundPoints>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .members
            .iter()
            .filter(|m| m.tournament_id == tournament_id)
            .map(|m| {
                state
                    .round_points
                    .get(&(tournament_id, m.user_id, round))
                    .cloned()
                    .unwrap_or(RoundPoints {
                        tournament_id,
                        user_id: m.user_id,
                        round,
                        points: 0,
                        live_points: 0,
                    })
            })
            .collect())
    }

    async fn membership_points(&self, tournament_id: Uuid) -> Result<Vec<MembershipPoints>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.members.iter().filter(|m| m.tournament_id == tournament_id).cloned().collect())
    }
}

#[async_trait]
impl ExecutionStore for MemoryStore {
    async fn insert_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_execution_writes {
            return Err(unavailable("execution"));
        }
        state.executions.push(record.clone());
        Ok(())
    }

    async fn update_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_execution_writes {
            return Err(unavailable("execution"));
        }
        let existing = state
            .executions
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "execution",
                id: record.id.to_string(),
            })?;
        *existing = record.clone();
        Ok(())
    }

    async fn recent_executions(&self, limit: i64) -> Result<Vec<ExecutionRecord>, StoreError> {
        let mut records = self.executions();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }

    async fn delete_executions_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap();
        let before = state.executions.len();
        state.executions.retain(|r| r.started_at >= cutoff);
        Ok((before - state.executions.len()) as u64)
    }
}

/// Keeps jobs by name without ever running them
#[derive(Default)]
pub struct FakeRegistry {
    jobs: Mutex<HashMap<Uuid, String>>,
    started: Mutex<bool>,
}

impl FakeRegistry {
    pub fn job_count(&self, name: &str) -> usize {
        self.jobs.lock().unwrap().values().filter(|n| n.as_str() == name).count()
    }

    pub fn total_jobs(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_started(&self) -> bool {
        *self.started.lock().unwrap()
    }

    /// Simulates a job vanishing behind the scheduler's back
    pub fn drop_jobs_named(&self, name: &str) {
        self.jobs.lock().unwrap().retain(|_, n| n.as_str() != name);
    }

    /// Simulates a job appearing behind the scheduler's back
    pub fn inject_job(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.jobs.lock().unwrap().insert(id, name.to_string());
        id
    }
}

#[async_trait]
impl TaskRegistry for FakeRegistry {
    async fn register(&self, name: &str, _job: Job) -> Result<Uuid, JobSchedulerError> {
        let id = Uuid::new_v4();
        self.jobs.lock().unwrap().insert(id, name.to_string());
        Ok(id)
    }

    async fn unregister(&self, job_id: &Uuid) -> Result<(), JobSchedulerError> {
        self.jobs.lock().unwrap().remove(job_id);
        Ok(())
    }

    async fn jobs_named(&self, name: &str) -> Vec<Uuid> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, n)| n.as_str() == name)
            .map(|(id, _)| *id)
            .collect()
    }

    async fn start(&self) -> Result<(), JobSchedulerError> {
        *self.started.lock().unwrap() = true;
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), JobSchedulerError> {
        *self.started.lock().unwrap() = false;
        self.jobs.lock().unwrap().clear();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ReportedError {
    pub tag: String,
    pub context: serde_json::Value,
    pub chain: String,
}

#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<ReportedError>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<ReportedError> {
        self.reports.lock().unwrap().clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.reports().into_iter().map(|r| r.tag).collect()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report_error(&self, tag: &str, context: serde_json::Value, error: &(dyn Error + 'static)) {
        self.reports.lock().unwrap().push(ReportedError {
            tag: tag.to_string(),
            context,
            chain: error_chain(error),
        });
    }
}
