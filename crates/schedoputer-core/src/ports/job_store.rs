//! JobStore port - ジョブの正本（source of truth）
//!
//! # 設計原則
//! - ジョブごとに 1 つの Mutex（`JobHandle`）で排他制御する
//! - scheduler と mutation API はどちらも同じ `JobHandle` をロックして
//!   check-and-write を行う
//! - ストア自体のロックは挿入・列挙の間だけ保持する

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Job, JobId};

/// Per-job exclusion unit shared by the scheduler and the request handlers.
pub type JobHandle = Arc<Mutex<Job>>;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Store a new job. Jobs are never removed.
    async fn insert(&self, job: Job) -> JobHandle;

    async fn get(&self, id: &JobId) -> Option<JobHandle>;

    /// All job ids, in creation order.
    async fn ids(&self) -> Vec<JobId>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
