//! Domain model (IDs, jobs, tasks, graphs, state, errors).
//!
//! - ids: JobId（ULID）, TaskKey, ResourceRef
//! - state: JobState, TaskStatus
//! - graph: TaskGraph の検証とデフォルトのパイプライン
//! - dependency: 依存解決（純粋関数）
//! - delay: `HH:MM` の遅延指定

pub mod delay;
pub mod dependency;
pub mod errors;
pub mod graph;
pub mod ids;
pub mod job;
pub mod state;
pub mod task;

pub use delay::DelaySpec;
pub use errors::{ErrorKind, SchedError};
pub use graph::{GraphError, TaskBlueprint, TaskGraph};
pub use ids::{JobId, ResourceRef, TaskKey};
pub use job::{Job, JobStatusView, TaskStatusView};
pub use state::{JobState, TaskStatus};
pub use task::Task;
