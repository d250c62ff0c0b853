//! JobService - ジョブの作成・照会・変更
//!
//! 支払いゲートを通ったリクエストだけがジョブを作ります。
//! 変更系の操作はジョブごとのロックを check-and-write の間ずっと握ります。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::app::mutation;
use crate::config::CancelPropagation;
use crate::domain::{DelaySpec, Job, JobId, JobStatusView, SchedError, TaskGraph, TaskKey};
use crate::payment::{Challenge, GateDecision, PaymentGate, PaymentProof, RequestHeaders};
use crate::ports::{Clock, IdGenerator, JobHandle, JobStore, ProofVerifier, Verification};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateJobRequest {
    pub prompt: String,
    pub schedule_hhmm: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub success: bool,
    pub job_id: JobId,
    pub scheduled_for: DateTime<Utc>,
    pub status_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(JobCreated),
    PaymentRequired(Challenge),
}

pub struct JobService {
    store: Arc<dyn JobStore>,
    gate: PaymentGate,
    verifier: Arc<dyn ProofVerifier>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    graph: TaskGraph,
    origin: String,
    cancel_propagation: CancelPropagation,
}

impl JobService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn JobStore>,
        gate: PaymentGate,
        verifier: Arc<dyn ProofVerifier>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        graph: TaskGraph,
        origin: impl Into<String>,
        cancel_propagation: CancelPropagation,
    ) -> Self {
        Self {
            store,
            gate,
            verifier,
            clock,
            ids,
            graph,
            origin: origin.into().trim_end_matches('/').to_string(),
            cancel_propagation,
        }
    }

    pub fn gate(&self) -> &PaymentGate {
        &self.gate
    }

    pub fn status_url(&self, id: &JobId) -> String {
        format!("{}/jobs/{}", self.origin, id)
    }

    /// Run the gate and the verifier. `Err` carries the challenge to send back.
    pub async fn authorize(&self, headers: &RequestHeaders) -> Result<PaymentProof, Challenge> {
        let proof = match self.gate.check(headers) {
            GateDecision::Authorized(proof) => proof,
            GateDecision::PaymentRequired(challenge) => return Err(challenge),
        };

        match self.verifier.verify(&proof, self.gate.requirements()).await {
            Verification::Valid => Ok(proof),
            Verification::Invalid(reason) => {
                info!(
                    outcome = "rejected",
                    resource = %self.gate.resource_url(),
                    header = %proof.header,
                    reason = %reason,
                    "payment proof rejected"
                );
                Err(self.gate.enforcement().with_error(reason))
            }
        }
    }

    /// Gate the request, verify its proof, then create the job.
    pub async fn create_job(
        &self,
        headers: &RequestHeaders,
        request: CreateJobRequest,
    ) -> Result<CreateOutcome, SchedError> {
        if let Err(challenge) = self.authorize(headers).await {
            return Ok(CreateOutcome::PaymentRequired(challenge));
        }
        let created = self.create(&request.prompt, &request.schedule_hhmm).await?;
        Ok(CreateOutcome::Created(created))
    }

    /// Create a job without going through the gate.
    pub async fn create(&self, prompt: &str, schedule_hhmm: &str) -> Result<JobCreated, SchedError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SchedError::InvalidInput("prompt must not be empty".to_string()));
        }
        let delay: DelaySpec = schedule_hhmm.parse()?;

        let now = self.clock.now();
        let scheduled_for = delay.scheduled_from(now)?;
        let id = self.ids.generate_job_id();
        let job = Job::new(id, prompt.to_string(), scheduled_for, &self.graph, now);
        self.store.insert(job).await;

        info!(job_id = %id, scheduled_for = %scheduled_for, delay = %delay, "job created");
        Ok(JobCreated {
            success: true,
            job_id: id,
            scheduled_for,
            status_url: self.status_url(&id),
        })
    }

    pub async fn status(&self, job_id: &str) -> Result<JobStatusView, SchedError> {
        let handle = self.handle(job_id).await?;
        let view = handle.lock().await.view();
        Ok(view)
    }

    pub async fn modify_task(&self, job_id: &str, task: &str, patch: &Value) -> Result<(), SchedError> {
        let handle = self.handle(job_id).await?;
        let mut job = handle.lock().await;
        mutation::modify_task(&mut job, &TaskKey::from(task), patch, self.clock.now())
    }

    pub async fn undo_task(&self, job_id: &str, task: &str) -> Result<Vec<TaskKey>, SchedError> {
        let handle = self.handle(job_id).await?;
        let mut job = handle.lock().await;
        mutation::undo_task(
            &mut job,
            &TaskKey::from(task),
            self.cancel_propagation,
            self.clock.now(),
        )
    }

    pub async fn complete_human_task(
        &self,
        job_id: &str,
        task: &str,
        result: Value,
    ) -> Result<(), SchedError> {
        let handle = self.handle(job_id).await?;
        let mut job = handle.lock().await;
        mutation::complete_human_task(&mut job, &TaskKey::from(task), result, self.clock.now())
    }

    async fn handle(&self, job_id: &str) -> Result<JobHandle, SchedError> {
        let not_found = || SchedError::NotFound("job".to_string());
        let id: JobId = job_id.parse().map_err(|_| not_found())?;
        self.store.get(&id).await.ok_or_else(not_found)
    }
}
