#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

use schedoputer_core::app::{App, AppBuilder, TickReport};
use schedoputer_core::config::EngineConfig;
use schedoputer_core::domain::{JobStatusView, TaskGraph};
use schedoputer_core::payment::RequestHeaders;
use schedoputer_core::ports::{FixedClock, InvocationError, ResourceCall, ResourceInvoker};

pub type Script = Box<dyn Fn(&ResourceCall) -> Result<Value, InvocationError> + Send + Sync>;

/// Answers every call with a script and records what it was asked.
pub struct ScriptedInvoker {
    script: Script,
    calls: Mutex<Vec<ResourceCall>>,
}

impl ScriptedInvoker {
    pub fn new(
        script: impl Fn(&ResourceCall) -> Result<Value, InvocationError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// `{ "text": "<resource> ok" }` for every call.
    pub fn succeeding() -> Arc<Self> {
        Self::new(|call| Ok(json!({ "text": format!("{} ok", call.resource) })))
    }

    pub fn calls(&self) -> Vec<ResourceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_per_resource(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for call in self.calls() {
            *counts.entry(call.resource.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

#[async_trait]
impl ResourceInvoker for ScriptedInvoker {
    async fn invoke(&self, call: &ResourceCall) -> Result<Value, InvocationError> {
        self.calls.lock().unwrap().push(call.clone());
        (self.script)(call)
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

pub struct Harness {
    pub app: App,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new(invoker: Arc<dyn ResourceInvoker>) -> Self {
        Self::with(EngineConfig::default(), TaskGraph::content_pipeline(), invoker)
    }

    pub fn with(config: EngineConfig, graph: TaskGraph, invoker: Arc<dyn ResourceInvoker>) -> Self {
        let clock = Arc::new(FixedClock::new(t0()));
        let app = AppBuilder::new(config)
            .graph(graph)
            .clock(clock.clone())
            .invoker(invoker)
            .build()
            .unwrap();
        Self { app, clock }
    }

    /// Create a job through the boundary, as a paying caller would.
    pub async fn create(&self, prompt: &str, schedule: &str) -> String {
        let headers = RequestHeaders::new().with("X-Payment", "test-proof");
        let body = serde_json::to_vec(&json!({ "prompt": prompt, "schedule_hhmm": schedule })).unwrap();
        let response = self.app.boundary.create(headers, body).await;
        assert_eq!(response.status, 200, "{:?}", response.body);
        response.json_body()["jobId"].as_str().unwrap().to_string()
    }

    /// One tick, waiting for every dispatch it started.
    pub async fn tick(&self) -> TickReport {
        let (report, dispatches) = self.app.scheduler.tick().await;
        dispatches.join().await;
        report
    }

    pub async fn status(&self, job_id: &str) -> JobStatusView {
        self.app.service.status(job_id).await.unwrap()
    }

    pub async fn task_statuses(&self, job_id: &str) -> Vec<String> {
        self.status(job_id)
            .await
            .tasks
            .iter()
            .map(|t| t.status.to_string())
            .collect()
    }
}
