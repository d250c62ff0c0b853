//! Mutation - 実行前のタスク変更（modify / undo）と人間タスクの完了
//!
//! すべての関数は呼び出し側がジョブのロックを握った状態で呼びます。
//! check と write を同じロックの中で行うので、scheduler の claim とは
//! どちらか一方が先に起きたように見えます。

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use crate::config::CancelPropagation;
use crate::domain::{Job, JobState, SchedError, TaskKey, TaskStatus, dependency};

/// Shallow-merge `patch` into the task's params. Only `pending` tasks qualify.
pub fn modify_task(
    job: &mut Job,
    key: &TaskKey,
    patch: &Value,
    now: DateTime<Utc>,
) -> Result<(), SchedError> {
    let Value::Object(patch) = patch else {
        return Err(SchedError::InvalidInput(
            "patch must be a JSON object".to_string(),
        ));
    };
    let task = job
        .task_mut(key)
        .ok_or_else(|| SchedError::NotFound(format!("task {key}")))?;
    if task.status != TaskStatus::Pending {
        return Err(SchedError::NotModifiable {
            task: key.clone(),
            status: task.status,
        });
    }

    for (k, v) in patch {
        task.params.insert(k.clone(), v.clone());
    }
    job.updated_at = now;
    info!(job_id = %job.id, task = %key, fields = patch.len(), "task modified");
    Ok(())
}

/// Cancel an undoable `pending` task.
///
/// Returns every task cancelled by the call, the target first.
pub fn undo_task(
    job: &mut Job,
    key: &TaskKey,
    propagation: CancelPropagation,
    now: DateTime<Utc>,
) -> Result<Vec<TaskKey>, SchedError> {
    let task = job
        .task_mut(key)
        .ok_or_else(|| SchedError::NotFound(format!("task {key}")))?;
    if !task.undoable {
        return Err(SchedError::NotUndoable {
            task: key.clone(),
            reason: "task is not undoable".to_string(),
        });
    }
    if task.status != TaskStatus::Pending {
        return Err(SchedError::NotUndoable {
            task: key.clone(),
            reason: format!("status is {}", task.status),
        });
    }

    task.mark_cancelled();
    let mut cancelled = vec![key.clone()];

    if propagation == CancelPropagation::Cascade {
        for dependent in dependency::transitive_dependents(&job.tasks, key) {
            if let Some(t) = job.task_mut(&dependent)
                && t.status == TaskStatus::Blocked
            {
                t.mark_cancelled();
                cancelled.push(dependent);
            }
        }
    }

    job.updated_at = now;
    info!(job_id = %job.id, task = %key, cancelled = cancelled.len(), "task undone");
    Ok(cancelled)
}

/// Record the external actor's result for a `waiting_human` task.
pub fn complete_human_task(
    job: &mut Job,
    key: &TaskKey,
    result: Value,
    now: DateTime<Utc>,
) -> Result<(), SchedError> {
    let task = job
        .task_mut(key)
        .ok_or_else(|| SchedError::NotFound(format!("task {key}")))?;
    if task.status != TaskStatus::WaitingHuman {
        return Err(SchedError::NotAwaitingHuman {
            task: key.clone(),
            status: task.status,
        });
    }

    task.mark_completed();
    let output_key = task.output_key.clone();
    job.record_output(&output_key, result, now);
    if job.state == JobState::WaitingOnExternal {
        job.set_state(JobState::Running, now);
    }
    info!(job_id = %job.id, task = %key, "human task completed");
    Ok(())
}
