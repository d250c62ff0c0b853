//! Task record: one step of a job's dependency graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::graph::TaskBlueprint;
use super::ids::{ResourceRef, TaskKey};
use super::state::TaskStatus;

/// A task inside a job.
///
/// Identity fields (`id`, `name`, `resource`, `depends_on`, `undoable`,
/// `output_key`) are fixed at graph construction. State transitions go
/// through the methods below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskKey,
    pub name: String,
    pub resource: Option<ResourceRef>,
    pub depends_on: Option<TaskKey>,
    pub undoable: bool,
    pub status: TaskStatus,

    /// Caller-editable parameters; mutable only while `pending`.
    pub params: Map<String, Value>,

    pub output_key: String,

    /// Number of times the external resource has been invoked.
    pub attempts: u32,
    pub last_error: Option<String>,

    /// Earliest time the next attempt may run (retry backoff).
    pub next_attempt_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn from_blueprint(bp: &TaskBlueprint) -> Self {
        let status = if bp.depends_on.is_some() {
            TaskStatus::Blocked
        } else {
            TaskStatus::Pending
        };
        Self {
            id: bp.key.clone(),
            name: bp.name.clone(),
            resource: bp.resource.clone(),
            depends_on: bp.depends_on.clone(),
            undoable: bp.undoable,
            status,
            params: Map::new(),
            output_key: bp.output_key.clone(),
            attempts: 0,
            last_error: None,
            next_attempt_at: None,
        }
    }

    pub fn is_human(&self) -> bool {
        self.resource.is_none()
    }

    /// Whether the retry backoff window has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_attempt_at.is_none_or(|at| now >= at)
    }

    /// pending -> ready (claimed by a tick).
    pub fn claim(&mut self) {
        self.status = TaskStatus::Ready;
    }

    /// ready -> running (increment attempts).
    pub fn start_attempt(&mut self) {
        self.status = TaskStatus::Running;
        self.attempts += 1;
    }

    /// pending -> waiting_human.
    pub fn await_human(&mut self) {
        self.status = TaskStatus::WaitingHuman;
    }

    pub fn mark_completed(&mut self) {
        self.status = TaskStatus::Completed;
        self.last_error = None;
        self.next_attempt_at = None;
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = TaskStatus::Failed;
        self.last_error = Some(error);
    }

    pub fn mark_cancelled(&mut self) {
        self.status = TaskStatus::Cancelled;
    }

    /// Back to `pending` after a transient failure; a later tick retries.
    pub fn release_for_retry(&mut self, error: String, next_attempt_at: Option<DateTime<Utc>>) {
        self.status = TaskStatus::Pending;
        self.last_error = Some(error);
        self.next_attempt_at = next_attempt_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn root_blueprint_starts_pending() {
        let bp = TaskBlueprint::resource("t1", "Draft", "llm.draft", None, false, "draft");
        let task = Task::from_blueprint(&bp);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.is_human());
        assert!(task.params.is_empty());
    }

    #[test]
    fn dependent_blueprint_starts_blocked() {
        let bp = TaskBlueprint::human("t2", "Publish", Some("t1"), true, "publication");
        let task = Task::from_blueprint(&bp);
        assert_eq!(task.status, TaskStatus::Blocked);
        assert!(task.is_human());
    }

    #[test]
    fn attempt_lifecycle_records_retry_bookkeeping() {
        let bp = TaskBlueprint::resource("t1", "Draft", "llm.draft", None, false, "draft");
        let mut task = Task::from_blueprint(&bp);
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

        task.claim();
        assert_eq!(task.status, TaskStatus::Ready);
        task.start_attempt();
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(task.attempts, 1);

        task.release_for_retry("payment required".into(), Some(now + Duration::seconds(4)));
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.is_due(now));
        assert!(task.is_due(now + Duration::seconds(4)));

        task.claim();
        task.start_attempt();
        task.mark_completed();
        assert_eq!(task.attempts, 2);
        assert!(task.last_error.is_none());
        assert!(task.is_due(now));
    }
}
