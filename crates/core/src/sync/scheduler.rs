use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::cycle::{RefreshOutcome, SyncCycleReport, SyncCycleStatus, SyncCycleTrigger};
use super::fetcher::DataFetcher;
use crate::errors::Result;
use crate::session::Session;

/// Default background refresh cadence.
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 30_000;

/// Intervals below this are raised to it.
pub const MIN_SYNC_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Lightweight scheduler status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSchedulerStatus {
    pub state: SchedulerState,
    pub interval_ms: Option<u64>,
    pub cycles: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_cycle_status: Option<SyncCycleStatus>,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct CycleStats {
    cycles: u64,
    last_cycle_at: Option<DateTime<Utc>>,
    last_cycle_status: Option<SyncCycleStatus>,
    last_error: Option<String>,
}

/// Runs fetch cycles one at a time, under the fetcher's cycle lock.
struct CycleRunner {
    fetcher: Arc<DataFetcher>,
    session: Arc<Session>,
    stats: Mutex<CycleStats>,
}

impl CycleRunner {
    /// Periodic cycle. Skipped when the scheduler was stopped while waiting
    /// for the lock.
    async fn run_periodic_cycle(
        &self,
        trigger: SyncCycleTrigger,
        stop_rx: &watch::Receiver<bool>,
    ) -> Option<SyncCycleReport> {
        let _cycle_guard = self.fetcher.lock_cycle().await;
        if *stop_rx.borrow() {
            debug!("[Sync] Scheduler stopped before {:?} cycle", trigger);
            return None;
        }
        Some(self.execute(trigger).await)
    }

    async fn try_run_cycle(&self, trigger: SyncCycleTrigger) -> RefreshOutcome {
        match self.fetcher.try_lock_cycle() {
            Some(_cycle_guard) => RefreshOutcome::Completed(self.execute(trigger).await),
            None => {
                debug!("[Sync] Cycle in flight, coalescing {:?} refresh", trigger);
                RefreshOutcome::Coalesced
            }
        }
    }

    async fn run_after_switch(
        &self,
        trigger: SyncCycleTrigger,
        reload_local: bool,
    ) -> Result<SyncCycleReport> {
        let _cycle_guard = self.fetcher.lock_cycle().await;
        if reload_local {
            self.fetcher.load_local().await?;
        }
        Ok(self.execute(trigger).await)
    }

    /// Fetch transactions and savings. Each failure is logged and recorded;
    /// neither aborts the other.
    async fn execute(&self, trigger: SyncCycleTrigger) -> SyncCycleReport {
        let started_at = Instant::now();
        let user_id = self.session.user_id();
        let mut errors = Vec::new();

        let transactions = match self.fetcher.fetch_transactions(user_id.as_deref()).await {
            Ok(transactions) => Some(transactions.len()),
            Err(err) => {
                warn!("[Sync] {:?} cycle: transactions not refreshed: {}", trigger, err);
                errors.push(format!("transactions: {}", err));
                None
            }
        };
        let savings_entries = match self.fetcher.fetch_savings(user_id.as_deref()).await {
            Ok(savings) => Some(savings.history.len()),
            Err(err) => {
                warn!("[Sync] {:?} cycle: savings not refreshed: {}", trigger, err);
                errors.push(format!("savings: {}", err));
                None
            }
        };

        let report = SyncCycleReport {
            trigger,
            status: SyncCycleStatus::from_outcomes(
                transactions.is_some(),
                savings_entries.is_some(),
            ),
            transactions,
            savings_entries,
            errors,
            duration_ms: started_at.elapsed().as_millis() as i64,
        };
        debug!(
            "[Sync] Cycle complete trigger={:?} status={:?} transactions={:?} savings={:?} duration_ms={}",
            report.trigger,
            report.status,
            report.transactions,
            report.savings_entries,
            report.duration_ms
        );
        self.record(&report);
        report
    }

    fn record(&self, report: &SyncCycleReport) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.cycles += 1;
        stats.last_cycle_at = Some(Utc::now());
        stats.last_cycle_status = Some(report.status);
        stats.last_error = report.errors.first().cloned();
    }
}

struct BackgroundTask {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    interval: Duration,
}

impl BackgroundTask {
    fn is_active(&self) -> bool {
        !self.handle.is_finished() && !*self.stop_tx.borrow()
    }
}

/// Periodic refresh of the ledger cache.
///
/// At most one timer is active. Stopping prevents any further cycle from
/// starting; a cycle already in flight still completes and commits.
pub struct SyncScheduler {
    runner: Arc<CycleRunner>,
    background: Mutex<Option<BackgroundTask>>,
}

impl SyncScheduler {
    pub fn new(fetcher: Arc<DataFetcher>, session: Arc<Session>) -> Self {
        Self {
            runner: Arc::new(CycleRunner {
                fetcher,
                session,
                stats: Mutex::new(CycleStats::default()),
            }),
            background: Mutex::new(None),
        }
    }

    /// Idle → Running. Returns `false` when a timer is already active.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, interval: Duration) -> bool {
        let interval = interval.max(Duration::from_millis(MIN_SYNC_INTERVAL_MS));
        let mut guard = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if guard.as_ref().is_some_and(BackgroundTask::is_active) {
            debug!("[Sync] Scheduler already running");
            return false;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_periodic(Arc::clone(&self.runner), interval, stop_rx));
        *guard = Some(BackgroundTask {
            stop_tx,
            handle,
            interval,
        });
        info!(
            "[Sync] Scheduler started, interval {} ms",
            interval.as_millis()
        );
        true
    }

    /// Running → Idle. Returns `false` when already idle.
    pub fn stop(&self) -> bool {
        let task = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match task {
            Some(task) => {
                // The loop checks this flag before and after taking the cycle
                // lock. The handle is dropped, not aborted, so an in-flight
                // cycle still commits.
                let _ = task.stop_tx.send(true);
                info!("[Sync] Scheduler stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(BackgroundTask::is_active)
    }

    /// Run a cycle now unless one is in flight.
    pub async fn refresh_now(&self, trigger: SyncCycleTrigger) -> RefreshOutcome {
        self.runner.try_run_cycle(trigger).await
    }

    /// Wait for any in-flight cycle, optionally reload the local store into
    /// the cache, then run one cycle. Never coalesced.
    pub async fn resync_after_switch(
        &self,
        trigger: SyncCycleTrigger,
        reload_local: bool,
    ) -> Result<SyncCycleReport> {
        self.runner.run_after_switch(trigger, reload_local).await
    }

    pub fn status(&self) -> SyncSchedulerStatus {
        let (state, interval_ms) = {
            let guard = self
                .background
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref().filter(|task| task.is_active()) {
                Some(task) => (
                    SchedulerState::Running,
                    Some(task.interval.as_millis() as u64),
                ),
                None => (SchedulerState::Idle, None),
            }
        };
        let stats = self
            .runner
            .stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        SyncSchedulerStatus {
            state,
            interval_ms,
            cycles: stats.cycles,
            last_cycle_at: stats.last_cycle_at,
            last_cycle_status: stats.last_cycle_status,
            last_error: stats.last_error.clone(),
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_periodic(
    runner: Arc<CycleRunner>,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut trigger = SyncCycleTrigger::Startup;

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }
        if *stop_rx.borrow() {
            break;
        }
        if runner.run_periodic_cycle(trigger, &stop_rx).await.is_none() {
            break;
        }
        trigger = SyncCycleTrigger::Periodic;
    }
    debug!("[Sync] Periodic loop exited");
}
