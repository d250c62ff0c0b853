//! Dispatch - 1 回の外部リソース呼び出し
//!
//! tick が `ready` にしたタスクを受け取り、
//! 1. ジョブをロックして ready -> running（attempts += 1）
//! 2. ロックを外して timeout 付きで invoke
//! 3. 再ロックして結果を反映
//!
//! の順に進めます。ロックを握ったまま await しません。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::retry::RetryPolicy;
use crate::domain::{ErrorKind, Job, JobId, JobState, TaskKey, TaskStatus};
use crate::ports::{Clock, InvocationError, JobHandle, ResourceCall, ResourceInvoker};

/// Upstream text handed to a dependent task is cut to this many characters.
pub const INPUT_MAX_CHARS: usize = 280;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    /// Transient failure; the task is `pending` again.
    Retrying,
    /// Fatal failure; task and job are `failed`.
    Failed,
    /// The task was no longer in the expected status when the dispatch ran.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub job_id: JobId,
    pub task: TaskKey,
    pub outcome: DispatchOutcome,
}

/// Dispatches spawned by one or more ticks.
///
/// Dropping this does not cancel the calls.
#[derive(Debug, Default)]
pub struct Dispatches {
    handles: Vec<JoinHandle<DispatchReport>>,
}

impl Dispatches {
    pub(crate) fn push(&mut self, handle: JoinHandle<DispatchReport>) {
        self.handles.push(handle);
    }

    pub fn extend(&mut self, other: Dispatches) {
        self.handles.extend(other.handles);
    }

    /// Forget dispatches that have already finished.
    pub fn prune_finished(&mut self) {
        self.handles.retain(|h| !h.is_finished());
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every dispatch to settle.
    pub async fn join(self) -> Vec<DispatchReport> {
        let mut reports = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => warn!(error = %e, "dispatch task did not finish"),
            }
        }
        reports
    }
}

#[derive(Clone)]
pub(crate) struct DispatchContext {
    pub invoker: Arc<dyn ResourceInvoker>,
    pub clock: Arc<dyn Clock>,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

/// Build the call for the task at `idx`. The task itself is not touched.
pub(crate) fn build_call(job: &Job, idx: usize) -> Option<ResourceCall> {
    let task = job.tasks.get(idx)?;
    let resource = task.resource.clone()?;

    let mut payload = json!({
        "prompt": job.prompt,
        "task": task.name,
        "params": Value::Object(task.params.clone()),
    });
    let upstream = task
        .depends_on
        .as_ref()
        .and_then(|dep| job.task(dep))
        .and_then(|dep| job.context.get(&dep.output_key));
    if let Some(value) = upstream {
        payload["input"] = Value::String(truncate_chars(&upstream_text(value), INPUT_MAX_CHARS));
    }

    Some(ResourceCall {
        job_id: job.id,
        task: task.id.clone(),
        resource,
        payload,
    })
}

/// Text form of an upstream output: the string itself, its `text` field, or its JSON.
pub(crate) fn upstream_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((end, _)) => s[..end].to_string(),
        None => s.to_string(),
    }
}

pub(crate) async fn run(handle: JobHandle, call: ResourceCall, ctx: DispatchContext) -> DispatchReport {
    let report = |outcome| DispatchReport {
        job_id: call.job_id,
        task: call.task.clone(),
        outcome,
    };

    {
        let mut job = handle.lock().await;
        let now = ctx.clock.now();
        let Some(task) = job.task_mut(&call.task) else {
            return report(DispatchOutcome::Skipped);
        };
        if task.status != TaskStatus::Ready {
            return report(DispatchOutcome::Skipped);
        }
        task.start_attempt();
        let attempts = task.attempts;
        job.updated_at = now;
        debug!(
            job_id = %call.job_id,
            task = %call.task,
            resource = %call.resource,
            attempts,
            "invoking resource"
        );
    }

    let result = match tokio::time::timeout(ctx.timeout, ctx.invoker.invoke(&call)).await {
        Ok(result) => result,
        Err(_) => Err(InvocationError::Timeout),
    };

    let now = ctx.clock.now();
    let mut job = handle.lock().await;
    report(apply_outcome(&mut job, &call, result, now, &ctx.retry))
}

/// Apply an invocation result to a task that is `running`.
pub(crate) fn apply_outcome(
    job: &mut Job,
    call: &ResourceCall,
    result: Result<Value, InvocationError>,
    now: DateTime<Utc>,
    retry: &RetryPolicy,
) -> DispatchOutcome {
    let Some(idx) = job.task_index(&call.task) else {
        return DispatchOutcome::Skipped;
    };
    if job.tasks[idx].status != TaskStatus::Running {
        return DispatchOutcome::Skipped;
    }

    match result {
        Ok(value) => {
            let task = &mut job.tasks[idx];
            task.mark_completed();
            let output_key = task.output_key.clone();
            job.record_output(&output_key, value, now);
            info!(
                job_id = %call.job_id,
                task = %call.task,
                resource = %call.resource,
                outcome = "completed",
                "task completed"
            );
            DispatchOutcome::Completed
        }
        Err(err) => match err.kind() {
            ErrorKind::Transient => {
                let task = &mut job.tasks[idx];
                let delay = retry.next_delay(task.attempts);
                let next_attempt_at = if delay.is_zero() {
                    None
                } else {
                    chrono::Duration::from_std(delay)
                        .ok()
                        .and_then(|d| now.checked_add_signed(d))
                };
                task.release_for_retry(err.to_string(), next_attempt_at);
                job.updated_at = now;
                info!(
                    job_id = %call.job_id,
                    task = %call.task,
                    resource = %call.resource,
                    outcome = "retrying",
                    error = %err,
                    "transient resource failure"
                );
                DispatchOutcome::Retrying
            }
            ErrorKind::Fatal => {
                job.tasks[idx].mark_failed(err.to_string());
                job.set_state(JobState::Failed, now);
                warn!(
                    job_id = %call.job_id,
                    task = %call.task,
                    resource = %call.resource,
                    outcome = "failed",
                    error = %err,
                    "task failed, job failed"
                );
                DispatchOutcome::Failed
            }
        },
    }
}
