//! InMemoryJobStore - プロセス内のジョブストア
//!
//! プロセス起動時に空で作成し、service と scheduler に注入します。
//! 再起動をまたいだ永続化はしません。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{Job, JobId};
use crate::ports::{JobHandle, JobStore};

#[derive(Default)]
struct StoreState {
    jobs: HashMap<JobId, JobHandle>,

    /// Insertion order, so ticks visit jobs oldest first.
    order: Vec<JobId>,
}

#[derive(Default)]
pub struct InMemoryJobStore {
    state: RwLock<StoreState>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: Job) -> JobHandle {
        let id = job.id;
        let handle = Arc::new(Mutex::new(job));
        let mut state = self.state.write().await;
        if state.jobs.insert(id, Arc::clone(&handle)).is_none() {
            state.order.push(id);
        }
        handle
    }

    async fn get(&self, id: &JobId) -> Option<JobHandle> {
        self.state.read().await.jobs.get(id).cloned()
    }

    async fn ids(&self) -> Vec<JobId> {
        self.state.read().await.order.clone()
    }

    async fn len(&self) -> usize {
        self.state.read().await.jobs.len()
    }
}
