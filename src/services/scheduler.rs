use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::config::settings::SchedulerSettings;
use crate::db::store::{RoundConfigStore, StoreError};
use crate::game::kickoff::{in_sweep_window, local_date, local_now};
use crate::models::execution::{ExecutionOutcome, ExecutionRecord, JobKind};
use crate::models::round_config::{CurrentRoundConfig, RoundUpdater};
use crate::services::error_reporter::ErrorReporter;
use crate::services::execution_ledger::{ExecutionLedger, RunningExecution};
use crate::services::round_state_service::RoundStateService;
use crate::services::scoring_service::{ProcessRoundResult, ScoringError, ScoringService};

const RECENT_EXECUTIONS_IN_STATUS: i64 = 20;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Where timer jobs live. Jobs are tracked by name so the registry can be
/// asked what is actually registered, independently of the scheduler's own
/// bookkeeping.
#[async_trait]
pub trait TaskRegistry: Send + Sync {
    async fn register(&self, name: &str, job: Job) -> Result<Uuid, JobSchedulerError>;

    async fn unregister(&self, job_id: &Uuid) -> Result<(), JobSchedulerError>;

    async fn jobs_named(&self, name: &str) -> Vec<Uuid>;

    async fn start(&self) -> Result<(), JobSchedulerError>;

    async fn shutdown(&self) -> Result<(), JobSchedulerError>;
}

/// `tokio-cron-scheduler` backed registry
pub struct CronTaskRegistry {
    scheduler: Mutex<JobScheduler>,
    jobs: Mutex<HashMap<Uuid, String>>,
}

impl CronTaskRegistry {
    pub async fn new() -> Result<Self, JobSchedulerError> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler: Mutex::new(scheduler),
            jobs: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl TaskRegistry for CronTaskRegistry {
    async fn register(&self, name: &str, job: Job) -> Result<Uuid, JobSchedulerError> {
        let scheduler = self.scheduler.lock().await;
        let job_id = scheduler.add(job).await?;

        self.jobs.lock().await.insert(job_id, name.to_string());
        Ok(job_id)
    }

    async fn unregister(&self, job_id: &Uuid) -> Result<(), JobSchedulerError> {
        let scheduler = self.scheduler.lock().await;
        scheduler.remove(job_id).await?;

        self.jobs.lock().await.remove(job_id);
        Ok(())
    }

    async fn jobs_named(&self, name: &str) -> Vec<Uuid> {
        self.jobs
            .lock()
            .await
            .iter()
            .filter(|(_, job_name)| job_name.as_str() == name)
            .map(|(job_id, _)| *job_id)
            .collect()
    }

    async fn start(&self) -> Result<(), JobSchedulerError> {
        let scheduler = self.scheduler.lock().await;
        scheduler.start().await
    }

    async fn shutdown(&self) -> Result<(), JobSchedulerError> {
        let mut scheduler = self.scheduler.lock().await;
        scheduler.shutdown().await?;

        self.jobs.lock().await.clear();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepState {
    #[default]
    Idle,
    /// Registration of the sweep job is in flight
    Starting,
    Active,
}

impl fmt::Display for SweepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepState::Idle => write!(f, "idle"),
            SweepState::Starting => write!(f, "starting"),
            SweepState::Active => write!(f, "active"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    None,
    Recreate,
    Remove,
}

/// Repair needed to bring the registry in line with the active flag
pub fn reconcile_action(active: bool, job_registered: bool) -> ReconcileAction {
    match (active, job_registered) {
        (true, false) => ReconcileAction::Recreate,
        (false, true) => ReconcileAction::Remove,
        _ => ReconcileAction::None,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub action: ReconcileAction,
    pub sweep_state: SweepState,
    pub sweep_job_id: Option<Uuid>,
    pub removed_jobs: usize,
}

#[derive(Debug, Default)]
struct SweepSlot {
    state: SweepState,
    job_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledJob {
    pub kind: JobKind,
    pub job_id: Uuid,
    pub schedule: String,
}

/// Snapshot for operators
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub sweep_state: SweepState,
    pub sweep_job_id: Option<Uuid>,
    pub registered_sweep_jobs: usize,
    pub in_sweep_window: bool,
    pub fixed_jobs: Vec<ScheduledJob>,
    pub current_round: Option<CurrentRoundConfig>,
    pub recent_executions: Vec<ExecutionRecord>,
}

/// One lock per job kind; a scheduled tick that finds its lock taken skips
struct RunGuards {
    locks: HashMap<JobKind, Arc<Mutex<()>>>,
}

impl RunGuards {
    fn new() -> Self {
        Self {
            locks: JobKind::ALL.iter().map(|kind| (*kind, Arc::new(Mutex::new(())))).collect(),
        }
    }

    fn lock_for(&self, kind: JobKind) -> Arc<Mutex<()>> {
        self.locks.get(&kind).cloned().unwrap_or_default()
    }

    fn try_acquire(&self, kind: JobKind) -> Option<OwnedMutexGuard<()>> {
        self.lock_for(kind).try_lock_owned().ok()
    }

    async fn acquire(&self, kind: JobKind) -> OwnedMutexGuard<()> {
        self.lock_for(kind).lock_owned().await
    }
}

/// Collaborators the scheduled jobs drive
pub struct SchedulerDependencies {
    pub round_state: Arc<RoundStateService>,
    pub round_config: Arc<dyn RoundConfigStore>,
    pub scoring: Arc<ScoringService>,
    pub ledger: Arc<ExecutionLedger>,
    pub reporter: Arc<dyn ErrorReporter>,
}

/// Shared by the service and by every job closure (through a weak handle)
struct SchedulerCore {
    registry: Arc<dyn TaskRegistry>,
    round_state: Arc<RoundStateService>,
    round_config: Arc<dyn RoundConfigStore>,
    scoring: Arc<ScoringService>,
    ledger: Arc<ExecutionLedger>,
    reporter: Arc<dyn ErrorReporter>,
    settings: SchedulerSettings,
    timezone: Tz,
    guards: RunGuards,
    sweep: Mutex<SweepSlot>,
}

impl SchedulerCore {
    fn build_job(self: &Arc<Self>, kind: JobKind, schedule: &str) -> Result<Job, JobSchedulerError> {
        let core: Weak<SchedulerCore> = Arc::downgrade(self);

        Job::new_async_tz(schedule, self.timezone, move |_uuid, _l| {
            let core = core.clone();
            Box::pin(async move {
                match core.upgrade() {
                    Some(core) => core.run_scheduled(kind).await,
                    None => debug!("Scheduler dropped, skipping {} tick", kind),
                }
            })
        })
    }

    /// Entry point of every timer tick
    async fn run_scheduled(self: Arc<Self>, kind: JobKind) {
        if kind == JobKind::ScoringSweep && !self.in_sweep_window() {
            debug!("Outside the sweep window, skipping scoring sweep tick");
            return;
        }

        let Some(_guard) = self.guards.try_acquire(kind) else {
            warn!("⚠️ Previous {} run still in flight, skipping this tick", kind);
            return;
        };

        let span = tracing::info_span!("scheduled_job", job = %kind);
        async {
            // Failures are already recorded in the ledger and reported
            match kind {
                JobKind::RecomputeRound => {
                    let _ = self.recompute_round(RoundUpdater::CronJob).await;
                }
                JobKind::ProbeMatchesToday => {
                    let _ = self.probe_matches_today().await;
                }
                JobKind::ScoringSweep => {
                    let _ = self.sweep("cron").await;
                }
                JobKind::LedgerPurge => {
                    let _ = self.purge_ledger().await;
                }
                JobKind::SweepLifecycle => {}
            }
        }
        .instrument(span)
        .await
    }

    fn in_sweep_window(&self) -> bool {
        in_sweep_window(
            local_now(&self.timezone).time(),
            self.settings.sweep_window_start_hour,
            self.settings.sweep_window_end_hour,
        )
    }

    async fn fail_run(
        &self,
        run: RunningExecution,
        tag: &str,
        error: SchedulerError,
        context: serde_json::Value,
    ) -> SchedulerError {
        self.reporter.report_error(tag, context, &error);
        self.ledger.fail(run, &error).await;
        error
    }

    async fn recompute_round(&self, updated_by: RoundUpdater) -> Result<ExecutionRecord, SchedulerError> {
        let previous = match self.round_config.get_current_round().await {
            Ok(config) => config.map(|c| c.round),
            Err(e) => {
                warn!("⚠️ Could not read the current round before recompute: {}", e);
                None
            }
        };
        let run = self.ledger.open(JobKind::RecomputeRound, Some(json!({ "round": previous }))).await;

        let detection = self.round_state.detect_current_round().await;

        match self.round_config.set_current_round(detection.round, updated_by).await {
            Ok(config) => {
                let changed = previous != Some(config.round);
                if changed {
                    info!("🔄 Current round moved from {:?} to {}", previous, config.round);
                } else {
                    info!("Current round unchanged at {}", config.round);
                }

                let outcome = ExecutionOutcome {
                    new_value: Some(json!({ "round": config.round })),
                    records_affected: i64::from(changed),
                    metadata: json!({ "detection": detection, "updated_by": updated_by }),
                };
                Ok(self.ledger.complete(run, outcome).await)
            }
            Err(e) => {
                let context = json!({ "previous_round": previous, "detected_round": detection.round });
                Err(self.fail_run(run, "scheduler.recompute_round", e.into(), context).await)
            }
        }
    }

    async fn sweep(&self, trigger: &str) -> Result<ProcessRoundResult, SchedulerError> {
        let run = self.ledger.open(JobKind::ScoringSweep, None).await;

        match self.scoring.process_round().await {
            Ok(result) => {
                let outcome = ExecutionOutcome {
                    new_value: Some(json!({
                        "round": result.round,
                        "final_count": result.final_count,
                        "live_count": result.live_count,
                    })),
                    records_affected: (result.final_count + result.live_count) as i64
                        + result.live_reset_count as i64,
                    metadata: json!({
                        "trigger": trigger,
                        "live_reset_count": result.live_reset_count,
                        "failed_predictions": result.failed_predictions,
                        "failed_matches": result.failed_matches,
                        "details": result.details,
                    }),
                };
                self.ledger.complete(run, outcome).await;
                Ok(result)
            }
            Err(e) => {
                let context = json!({ "trigger": trigger });
                Err(self.fail_run(run, "scheduler.scoring_sweep", e.into(), context).await)
            }
        }
    }

    async fn probe_matches_today(self: &Arc<Self>) -> Result<SweepState, SchedulerError> {
        let previous = self.sweep_state().await;
        let run = self
            .ledger
            .open(JobKind::ProbeMatchesToday, Some(json!({ "sweep_state": previous })))
            .await;

        let today = local_date(&self.timezone, Utc::now());
        let has_matches = match self.scoring.has_matches_on(today).await {
            Ok(has_matches) => has_matches,
            Err(e) => {
                let context = json!({ "date": today.to_string() });
                return Err(self.fail_run(run, "scheduler.probe_matches_today", e.into(), context).await);
            }
        };

        info!("📅 Matches on {}: {}", today, has_matches);
        let transition = if has_matches {
            self.activate_sweep().await
        } else {
            self.deactivate_sweep().await
        };

        match transition {
            Ok(changed) => {
                let state = self.sweep_state().await;
                let outcome = ExecutionOutcome {
                    new_value: Some(json!({ "sweep_state": state })),
                    records_affected: i64::from(changed),
                    metadata: json!({ "date": today.to_string(), "matches_today": has_matches }),
                };
                self.ledger.complete(run, outcome).await;
                Ok(state)
            }
            Err(e) => {
                let context = json!({ "date": today.to_string(), "matches_today": has_matches });
                Err(self.fail_run(run, "scheduler.probe_matches_today", e, context).await)
            }
        }
    }

    async fn sweep_state(&self) -> SweepState {
        self.sweep.lock().await.state
    }

    async fn register_sweep_job(self: &Arc<Self>) -> Result<Uuid, JobSchedulerError> {
        let job = self.build_job(JobKind::ScoringSweep, &self.settings.sweep_cron)?;
        self.registry.register(JobKind::ScoringSweep.as_str(), job).await
    }

    /// Idle -> Starting -> Active. A no-op unless idle. Returns whether the
    /// state changed.
    async fn activate_sweep(self: &Arc<Self>) -> Result<bool, SchedulerError> {
        {
            let mut slot = self.sweep.lock().await;
            if slot.state != SweepState::Idle {
                debug!("Scoring sweep already {}, nothing to activate", slot.state);
                return Ok(false);
            }
            slot.state = SweepState::Starting;
        }

        let run = self
            .ledger
            .open(JobKind::SweepLifecycle, Some(json!({ "sweep_state": SweepState::Idle })))
            .await;
        let registered = self.register_sweep_job().await;

        let mut slot = self.sweep.lock().await;
        match registered {
            Ok(job_id) if slot.state == SweepState::Starting => {
                slot.state = SweepState::Active;
                slot.job_id = Some(job_id);
                drop(slot);

                info!("▶️ Scoring sweep activated (job {})", job_id);
                let outcome = ExecutionOutcome {
                    new_value: Some(json!({ "sweep_state": SweepState::Active, "job_id": job_id })),
                    records_affected: 1,
                    metadata: json!({ "action": "activate" }),
                };
                self.ledger.complete(run, outcome).await;
                Ok(true)
            }
            Ok(job_id) => {
                // Deactivated while the job was being registered
                let state = slot.state;
                drop(slot);

                if let Err(e) = self.registry.unregister(&job_id).await {
                    warn!("⚠️ Failed to drop sweep job {} after cancelled activation: {}", job_id, e);
                }
                let outcome = ExecutionOutcome {
                    new_value: Some(json!({ "sweep_state": state })),
                    records_affected: 0,
                    metadata: json!({ "action": "activate", "cancelled": true }),
                };
                self.ledger.complete(run, outcome).await;
                Ok(false)
            }
            Err(e) => {
                slot.state = SweepState::Idle;
                drop(slot);
                Err(self
                    .fail_run(run, "scheduler.activate_sweep", e.into(), json!({ "action": "activate" }))
                    .await)
            }
        }
    }

    /// Active or Starting -> Idle. A no-op when idle. In-flight sweeps are
    /// left to finish.
    async fn deactivate_sweep(&self) -> Result<bool, SchedulerError> {
        let (previous, job_id) = {
            let mut slot = self.sweep.lock().await;
            let previous = slot.state;
            if previous == SweepState::Idle {
                debug!("Scoring sweep already idle, nothing to deactivate");
                return Ok(false);
            }
            slot.state = SweepState::Idle;
            (previous, slot.job_id.take())
        };

        let run = self
            .ledger
            .open(JobKind::SweepLifecycle, Some(json!({ "sweep_state": previous, "job_id": job_id })))
            .await;

        if let Some(job_id) = job_id {
            if let Err(e) = self.registry.unregister(&job_id).await {
                let context = json!({ "action": "deactivate", "job_id": job_id });
                return Err(self.fail_run(run, "scheduler.deactivate_sweep", e.into(), context).await);
            }
        }

        info!("⏹️ Scoring sweep deactivated");
        let outcome = ExecutionOutcome {
            new_value: Some(json!({ "sweep_state": SweepState::Idle })),
            records_affected: 1,
            metadata: json!({ "action": "deactivate" }),
        };
        self.ledger.complete(run, outcome).await;
        Ok(true)
    }

    async fn reconcile(self: &Arc<Self>) -> Result<ReconcileReport, SchedulerError> {
        let (state, job_id) = {
            let slot = self.sweep.lock().await;
            (slot.state, slot.job_id)
        };

        if state == SweepState::Starting {
            debug!("Sweep activation in flight, skipping reconciliation");
            return Ok(ReconcileReport {
                action: ReconcileAction::None,
                sweep_state: state,
                sweep_job_id: job_id,
                removed_jobs: 0,
            });
        }

        let registered = self.registry.jobs_named(JobKind::ScoringSweep.as_str()).await;
        let active = state == SweepState::Active;
        let job_registered = if active {
            job_id.is_some_and(|id| registered.contains(&id))
        } else {
            !registered.is_empty()
        };
        let action = reconcile_action(active, job_registered);

        // Everything else registered under the sweep name is a stray
        let mut keep = if active && job_registered { job_id } else { None };
        let mut removed_jobs = 0;

        let strays = registered.iter().filter(|id| Some(**id) != keep).count();
        if action == ReconcileAction::None && strays == 0 {
            return Ok(ReconcileReport { action, sweep_state: state, sweep_job_id: keep, removed_jobs });
        }

        let run = self
            .ledger
            .open(
                JobKind::SweepLifecycle,
                Some(json!({ "sweep_state": state, "job_id": job_id, "registered": registered.len() })),
            )
            .await;

        if action == ReconcileAction::Recreate {
            warn!("🔧 Sweep flagged active but no job registered, recreating it");
            match self.register_sweep_job().await {
                Ok(new_id) => {
                    let mut slot = self.sweep.lock().await;
                    if slot.state == SweepState::Active {
                        slot.job_id = Some(new_id);
                        keep = Some(new_id);
                    } else {
                        keep = None;
                        removed_jobs += usize::from(self.registry.unregister(&new_id).await.is_ok());
                    }
                }
                Err(e) => {
                    let context = json!({ "action": "reconcile", "repair": action });
                    return Err(self.fail_run(run, "scheduler.reconcile", e.into(), context).await);
                }
            }
        } else if action == ReconcileAction::Remove {
            warn!("🔧 Sweep flagged idle but {} job(s) registered, removing them", registered.len());
        }

        for stray in registered.iter().filter(|id| Some(**id) != keep) {
            if let Err(e) = self.registry.unregister(stray).await {
                let context = json!({ "action": "reconcile", "repair": action, "job_id": stray });
                return Err(self.fail_run(run, "scheduler.reconcile", e.into(), context).await);
            }
            removed_jobs += 1;
        }

        let sweep_state = self.sweep_state().await;
        let outcome = ExecutionOutcome {
            new_value: Some(json!({ "sweep_state": sweep_state, "job_id": keep })),
            records_affected: removed_jobs as i64 + i64::from(action == ReconcileAction::Recreate),
            metadata: json!({ "action": "reconcile", "repair": action, "removed_jobs": removed_jobs }),
        };
        self.ledger.complete(run, outcome).await;

        Ok(ReconcileReport { action, sweep_state, sweep_job_id: keep, removed_jobs })
    }

    async fn purge_ledger(&self) -> Result<u64, SchedulerError> {
        let retention_days = self.settings.ledger_retention_days;
        let run = self
            .ledger
            .open(JobKind::LedgerPurge, Some(json!({ "retention_days": retention_days })))
            .await;

        match self.ledger.purge_older_than(retention_days).await {
            Ok(deleted) => {
                let outcome = ExecutionOutcome {
                    new_value: Some(json!({ "deleted": deleted })),
                    records_affected: deleted as i64,
                    metadata: json!({ "retention_days": retention_days }),
                };
                self.ledger.complete(run, outcome).await;
                Ok(deleted)
            }
            Err(e) => {
                let context = json!({ "retention_days": retention_days });
                Err(self.fail_run(run, "scheduler.purge_ledger", e.into(), context).await)
            }
        }
    }
}

/// Owns the fixed jobs (round recompute, matches-today probe, ledger purge)
/// and the scoring sweep that only exists while matches are being played.
pub struct SchedulerService {
    core: Arc<SchedulerCore>,
    fixed_jobs: Mutex<Vec<ScheduledJob>>,
    running: AtomicBool,
}

impl SchedulerService {
    pub fn new(
        registry: Arc<dyn TaskRegistry>,
        deps: SchedulerDependencies,
        settings: SchedulerSettings,
        timezone: Tz,
    ) -> Self {
        let core = SchedulerCore {
            registry,
            round_state: deps.round_state,
            round_config: deps.round_config,
            scoring: deps.scoring,
            ledger: deps.ledger,
            reporter: deps.reporter,
            settings,
            timezone,
            guards: RunGuards::new(),
            sweep: Mutex::new(SweepSlot::default()),
        };

        Self {
            core: Arc::new(core),
            fixed_jobs: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Registers the fixed jobs and starts ticking. Calling it again while
    /// running is a no-op.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Scheduler already running");
            return Ok(());
        }

        let settings = &self.core.settings;
        let mut schedules: Vec<(JobKind, String)> = settings
            .recompute_crons
            .iter()
            .map(|cron| (JobKind::RecomputeRound, cron.clone()))
            .collect();
        schedules.push((JobKind::ProbeMatchesToday, settings.probe_cron.clone()));
        schedules.push((JobKind::LedgerPurge, settings.ledger_purge_cron.clone()));

        let result = self.register_fixed_jobs(schedules).await;
        if let Err(e) = result {
            self.running.store(false, Ordering::SeqCst);
            return Err(e);
        }

        if let Err(e) = self.core.registry.start().await {
            self.running.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        info!("✅ Scheduler service started ({} timezone)", self.core.timezone);
        Ok(())
    }

    async fn register_fixed_jobs(&self, schedules: Vec<(JobKind, String)>) -> Result<(), SchedulerError> {
        let mut fixed_jobs = self.fixed_jobs.lock().await;

        for (kind, schedule) in schedules {
            let job = self.core.build_job(kind, &schedule)?;
            let job_id = self.core.registry.register(kind.as_str(), job).await?;
            info!("✅ Scheduled {} ({})", kind, schedule);
            fixed_jobs.push(ScheduledJob { kind, job_id, schedule });
        }

        Ok(())
    }

    /// Shuts the registry down. The sweep job goes with it, so the sweep
    /// slot is reset to idle.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        self.core.registry.shutdown().await?;
        self.fixed_jobs.lock().await.clear();
        *self.core.sweep.lock().await = SweepSlot::default();
        self.running.store(false, Ordering::SeqCst);

        info!("🛑 Scheduler service stopped");
        Ok(())
    }

    /// Recomputes and commits the current round now, recorded as a manual
    /// update
    pub async fn force_recompute(&self) -> Result<ExecutionRecord, SchedulerError> {
        let _guard = self.core.guards.acquire(JobKind::RecomputeRound).await;
        self.core.recompute_round(RoundUpdater::Manual).await
    }

    /// Runs one scoring sweep now, regardless of the play window
    pub async fn force_sweep(&self) -> Result<ProcessRoundResult, SchedulerError> {
        let _guard = self.core.guards.acquire(JobKind::ScoringSweep).await;
        self.core.sweep("manual").await
    }

    pub async fn probe_matches_today(&self) -> Result<SweepState, SchedulerError> {
        let _guard = self.core.guards.acquire(JobKind::ProbeMatchesToday).await;
        self.core.probe_matches_today().await
    }

    pub async fn activate_sweep(&self) -> Result<bool, SchedulerError> {
        self.core.activate_sweep().await
    }

    pub async fn deactivate_sweep(&self) -> Result<bool, SchedulerError> {
        self.core.deactivate_sweep().await
    }

    /// Repairs drift between the active flag and the registered sweep job
    pub async fn reconcile(&self) -> Result<ReconcileReport, SchedulerError> {
        self.core.reconcile().await
    }

    pub async fn purge_ledger(&self) -> Result<u64, SchedulerError> {
        let _guard = self.core.guards.acquire(JobKind::LedgerPurge).await;
        self.core.purge_ledger().await
    }

    pub async fn sweep_state(&self) -> SweepState {
        self.core.sweep_state().await
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> SchedulerStatus {
        let (sweep_state, sweep_job_id) = {
            let slot = self.core.sweep.lock().await;
            (slot.state, slot.job_id)
        };
        let registered_sweep_jobs = self.core.registry.jobs_named(JobKind::ScoringSweep.as_str()).await.len();

        let current_round = match self.core.round_config.get_current_round().await {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️ Status snapshot without current round: {}", e);
                None
            }
        };
        let recent_executions = match self.core.ledger.recent(RECENT_EXECUTIONS_IN_STATUS).await {
            Ok(records) => records,
            Err(e) => {
                warn!("⚠️ Status snapshot without recent executions: {}", e);
                Vec::new()
            }
        };

        SchedulerStatus {
            running: self.is_running(),
            sweep_state,
            sweep_job_id,
            registered_sweep_jobs,
            in_sweep_window: self.core.in_sweep_window(),
            fixed_jobs: self.fixed_jobs.lock().await.clone(),
            current_round,
            recent_executions,
        }
    }
}
