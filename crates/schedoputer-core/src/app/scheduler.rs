//! Scheduler - 定期 tick でジョブを進める
//!
//! 1 tick でジョブごとに高々 1 タスクを進めます。外部呼び出しは
//! ジョブごとに spawn するので、遅いジョブが他のジョブを待たせません。
//!
//! # 停止
//! `SchedulerHandle::shutdown_and_join()` で新しい tick を止め、
//! 実行中の dispatch が終わるのを待ちます。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::app::dispatch::{self, DispatchContext, Dispatches};
use crate::app::retry::RetryPolicy;
use crate::config::SchedulerConfig;
use crate::domain::{Job, JobState, TaskStatus, dependency};
use crate::ports::{Clock, JobStore, ResourceCall, ResourceInvoker};

/// Counters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub jobs_visited: usize,
    pub jobs_started: usize,
    pub tasks_promoted: usize,
    pub tasks_dispatched: usize,
    pub tasks_sent_to_human: usize,
    pub jobs_completed: usize,
}

pub struct Scheduler {
    store: Arc<dyn JobStore>,
    clock: Arc<dyn Clock>,
    dispatch: DispatchContext,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn JobStore>,
        invoker: Arc<dyn ResourceInvoker>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        let retry = config.retry.policy();
        Self::with_retry(store, invoker, clock, config, retry)
    }

    pub fn with_retry(
        store: Arc<dyn JobStore>,
        invoker: Arc<dyn ResourceInvoker>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
        retry: RetryPolicy,
    ) -> Self {
        let dispatch = DispatchContext {
            invoker,
            clock: Arc::clone(&clock),
            retry,
            timeout: config.invoke_timeout(),
        };
        Self {
            store,
            clock,
            dispatch,
            config,
        }
    }

    /// Run one pass over every stored job.
    ///
    /// Resource calls claimed during the pass are already running when this
    /// returns; await the `Dispatches` to observe their outcome.
    pub async fn tick(&self) -> (TickReport, Dispatches) {
        let now = self.clock.now();
        let mut report = TickReport::default();
        let mut dispatches = Dispatches::default();

        for id in self.store.ids().await {
            let Some(handle) = self.store.get(&id).await else {
                continue;
            };
            report.jobs_visited += 1;

            let call = {
                let mut job = handle.lock().await;
                advance_job(&mut job, now, &mut report)
            };

            if let Some(call) = call {
                let ctx = self.dispatch.clone();
                dispatches.push(tokio::spawn(dispatch::run(handle, call, ctx)));
            }
        }

        debug!(
            jobs_visited = report.jobs_visited,
            jobs_started = report.jobs_started,
            tasks_promoted = report.tasks_promoted,
            tasks_dispatched = report.tasks_dispatched,
            tasks_sent_to_human = report.tasks_sent_to_human,
            jobs_completed = report.jobs_completed,
            "tick finished"
        );
        (report, dispatches)
    }

    /// Tick on a fixed interval until shut down.
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.config.tick_interval();

        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut in_flight = Dispatches::default();
            info!(tick_interval_secs = period.as_secs(), "scheduler started");

            loop {
                if *shutdown_rx.borrow() {
                    break;
                }
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        // sender dropped counts as shutdown
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        let (_, dispatches) = self.tick().await;
                        in_flight.prune_finished();
                        in_flight.extend(dispatches);
                    }
                }
            }

            let pending = in_flight.len();
            in_flight.join().await;
            info!(drained = pending, "scheduler stopped");
        });

        SchedulerHandle { shutdown_tx, join }
    }
}

/// Handle to a spawned scheduler loop.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop taking new ticks. In-flight dispatches are allowed to finish.
    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

/// Advance one job by at most one task.
///
/// Returns the claimed call when a resource task was moved to `ready`.
pub(crate) fn advance_job(
    job: &mut Job,
    now: DateTime<Utc>,
    report: &mut TickReport,
) -> Option<ResourceCall> {
    if job.start_if_due(now) {
        report.jobs_started += 1;
        info!(job_id = %job.id, "job started");
    }
    if !job.state.is_active() {
        return None;
    }

    let promoted = dependency::resolve(&mut job.tasks);
    if promoted > 0 {
        report.tasks_promoted += promoted;
        job.updated_at = now;
    }

    if job.has_task_in_flight() {
        return None;
    }

    let Some(idx) = job
        .tasks
        .iter()
        .position(|t| t.status == TaskStatus::Pending)
    else {
        settle_idle_job(job, now, report);
        return None;
    };

    let task = &job.tasks[idx];
    if !task.is_due(now) || !dependency::dependency_met(&job.tasks, task) {
        return None;
    }

    if task.is_human() {
        job.tasks[idx].await_human();
        job.set_state(JobState::WaitingOnExternal, now);
        report.tasks_sent_to_human += 1;
        info!(job_id = %job.id, task = %job.tasks[idx].id, "waiting for human");
        return None;
    }

    let call = dispatch::build_call(job, idx)?;
    job.tasks[idx].claim();
    if job.state == JobState::WaitingOnExternal {
        job.set_state(JobState::Running, now);
    } else {
        job.updated_at = now;
    }
    report.tasks_dispatched += 1;
    debug!(job_id = %job.id, task = %call.task, resource = %call.resource, "task claimed");
    Some(call)
}

fn settle_idle_job(job: &mut Job, now: DateTime<Utc>, report: &mut TickReport) {
    if job.all_tasks_terminal() {
        job.set_state(JobState::Completed, now);
        report.jobs_completed += 1;
        info!(job_id = %job.id, "job completed");
    } else if job.has_task_waiting_human() && job.state != JobState::WaitingOnExternal {
        job.set_state(JobState::WaitingOnExternal, now);
    }
}
