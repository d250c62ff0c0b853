//! State - タスクとジョブの状態
//!
//! # Job の状態遷移
//! - scheduled -> running（scheduled_for に到達）
//! - running <-> waiting_on_external（human タスク待ち）
//! - running -> completed（全タスクが終端）
//! - running -> failed（タスクが致命的に失敗）
//!
//! # Task の状態遷移
//! - blocked -> pending（依存先が completed）
//! - pending -> ready -> running -> completed / failed
//! - running -> pending（一時的な失敗・payment required）
//! - pending -> waiting_human -> completed（human タスク）
//! - pending -> cancelled（undo）

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Scheduled,
    Running,
    WaitingOnExternal,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Whether the scheduler advances tasks of a job in this state.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Running | JobState::WaitingOnExternal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Scheduled => "scheduled",
            JobState::Running => "running",
            JobState::WaitingOnExternal => "waiting_on_external",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single task.
///
/// `Ready` means a tick has claimed the task and handed it to the job's
/// dispatcher; the external call has not started yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Blocked,
    Pending,
    Ready,
    Running,
    WaitingHuman,
    Completed,
    Cancelled,
    Failed,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Cancelled | TaskStatus::Failed
        )
    }

    /// Claimed or executing; the job must not dispatch anything else.
    pub fn is_in_flight(self) -> bool {
        matches!(self, TaskStatus::Ready | TaskStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Blocked => "blocked",
            TaskStatus::Pending => "pending",
            TaskStatus::Ready => "ready",
            TaskStatus::Running => "running",
            TaskStatus::WaitingHuman => "waiting_human",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
