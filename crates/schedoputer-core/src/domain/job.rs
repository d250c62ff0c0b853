//! Job record and status views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::graph::TaskGraph;
use super::ids::{JobId, TaskKey};
use super::state::{JobState, TaskStatus};
use super::task::Task;

/// Job record: one scheduled multi-task workflow.
///
/// Design: same pattern as the task record.
/// - Single source of truth for a job and its tasks
/// - State transitions via methods; the task list is never resized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub prompt: String,
    pub scheduled_for: DateTime<Utc>,
    pub state: JobState,
    pub tasks: Vec<Task>,

    /// Written only by task execution; read by status queries.
    pub context: Map<String, Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        id: JobId,
        prompt: String,
        scheduled_for: DateTime<Utc>,
        graph: &TaskGraph,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            prompt,
            scheduled_for,
            state: JobState::Scheduled,
            tasks: graph.blueprints().iter().map(Task::from_blueprint).collect(),
            context: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn task(&self, key: &TaskKey) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == key)
    }

    pub fn task_mut(&mut self, key: &TaskKey) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == key)
    }

    pub fn task_index(&self, key: &TaskKey) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == key)
    }

    /// scheduled -> running once `scheduled_for` has passed.
    ///
    /// Returns true if the job transitioned.
    pub fn start_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.state == JobState::Scheduled && now >= self.scheduled_for {
            self.set_state(JobState::Running, now);
            true
        } else {
            false
        }
    }

    pub fn set_state(&mut self, state: JobState, now: DateTime<Utc>) {
        self.state = state;
        self.updated_at = now;
    }

    pub fn has_task_in_flight(&self) -> bool {
        self.tasks.iter().any(|t| t.status.is_in_flight())
    }

    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.iter().all(|t| t.status.is_terminal())
    }

    pub fn has_task_waiting_human(&self) -> bool {
        self.tasks.iter().any(|t| t.status == TaskStatus::WaitingHuman)
    }

    /// Merge a task result into the context under the task's output key.
    pub fn record_output(&mut self, output_key: &str, value: Value, now: DateTime<Utc>) {
        self.context.insert(output_key.to_string(), value);
        self.updated_at = now;
    }

    pub fn view(&self) -> JobStatusView {
        JobStatusView {
            job_id: self.id,
            state: self.state,
            scheduled_for: self.scheduled_for,
            tasks: self
                .tasks
                .iter()
                .map(|t| TaskStatusView {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    status: t.status,
                    attempts: t.attempts,
                })
                .collect(),
            context: self.context.clone(),
        }
    }
}

/// Job status for API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub job_id: JobId,
    pub state: JobState,
    pub scheduled_for: DateTime<Utc>,
    pub tasks: Vec<TaskStatusView>,
    pub context: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusView {
    pub id: TaskKey,
    pub name: String,
    pub status: TaskStatus,
    pub attempts: u32,
}
