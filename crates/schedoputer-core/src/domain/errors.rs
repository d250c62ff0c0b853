//! Errors - エラー型と分類
//!
//! `SchedError` は呼び出し側に見えるエラー。payment required はエラーではなく
//! `payment::GateDecision` の分岐として扱います。

use thiserror::Error;

use super::graph::GraphError;
use super::ids::TaskKey;
use super::state::TaskStatus;

/// ErrorKind は外部呼び出しエラーの運用分類
///
/// - Transient: 次の tick で自動リトライ（payment required, timeout, rate limit）
/// - Fatal: ジョブ全体を failed にする
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Fatal,
}

#[derive(Debug, Error)]
pub enum SchedError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("task {task} is not modifiable (status: {status})")]
    NotModifiable { task: TaskKey, status: TaskStatus },

    #[error("task {task} cannot be undone: {reason}")]
    NotUndoable { task: TaskKey, reason: String },

    #[error("task {task} is not awaiting a human (status: {status})")]
    NotAwaitingHuman { task: TaskKey, status: TaskStatus },

    #[error("invalid task graph: {0}")]
    Graph(#[from] GraphError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SchedError {
    /// Client errors are reported as 400 and never retried.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, SchedError::Internal(_) | SchedError::Graph(_))
    }
}
