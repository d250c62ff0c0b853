//! The spawned scheduler loop and per-job dispatch isolation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use common::Harness;
use schedoputer_core::config::EngineConfig;
use schedoputer_core::domain::{JobState, TaskGraph, TaskStatus};
use schedoputer_core::impls::EchoResourceInvoker;
use schedoputer_core::ports::{InvocationError, ResourceCall, ResourceInvoker};

/// Calls for the prompt "slow" block until released.
struct GatedInvoker {
    release: Notify,
}

#[async_trait]
impl ResourceInvoker for GatedInvoker {
    async fn invoke(&self, call: &ResourceCall) -> Result<Value, InvocationError> {
        if call.payload["prompt"] == "slow" {
            self.release.notified().await;
        }
        Ok(json!("done"))
    }
}

async fn wait_for<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn slow_job_does_not_hold_up_others() {
    let invoker = Arc::new(GatedInvoker { release: Notify::new() });
    let h = Harness::new(invoker.clone());
    let slow = h.create("slow", "0:00").await;
    let fast = h.create("fast", "0:00").await;

    let (report, dispatches) = h.app.scheduler.tick().await;
    assert_eq!(report.tasks_dispatched, 2);

    let (harness, fast) = (&h, fast.as_str());
    wait_for(move || async move {
        harness.status(fast).await.tasks[0].status == TaskStatus::Completed
    })
    .await;
    assert_eq!(h.status(&slow).await.tasks[0].status, TaskStatus::Running);

    // in-flight job is not advanced again
    let (again, _) = h.app.scheduler.tick().await;
    assert_eq!(again.tasks_dispatched, 0);

    invoker.release.notify_one();
    dispatches.join().await;
    assert_eq!(h.status(&slow).await.tasks[0].status, TaskStatus::Completed);
}

#[tokio::test]
async fn stuck_call_times_out_and_is_retried() {
    let invoker = Arc::new(GatedInvoker { release: Notify::new() });
    let mut config = EngineConfig::default();
    config.scheduler.invoke_timeout_secs = 1;
    let h = Harness::with(config, TaskGraph::content_pipeline(), invoker);
    let id = h.create("slow", "0:00").await;

    h.tick().await;

    let view = h.status(&id).await;
    assert_eq!(view.state, JobState::Running);
    assert_eq!(view.tasks[0].status, TaskStatus::Pending);
    assert_eq!(view.tasks[0].attempts, 1);
}

#[tokio::test]
async fn spawned_loop_ticks_until_shutdown() {
    let mut config = EngineConfig::default();
    config.scheduler.tick_interval_secs = 1;
    let h = Harness::with(config, TaskGraph::content_pipeline(), Arc::new(EchoResourceInvoker));
    let id = h.create("background", "0:00").await;

    let handle = Arc::clone(&h.app.scheduler).spawn();

    // first interval tick fires immediately
    let (harness, job) = (&h, id.as_str());
    wait_for(move || async move {
        harness.status(job).await.tasks[0].status == TaskStatus::Completed
    })
    .await;
    handle.shutdown_and_join().await;

    let view = h.status(&id).await;
    assert_eq!(view.context["draft"]["text"], "llm.draft: background");
}
