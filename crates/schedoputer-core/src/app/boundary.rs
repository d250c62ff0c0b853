//! Boundary - トランスポート非依存のリクエスト境界
//!
//! 各操作を `ApiResponse { status, headers, body }` に変換します。
//! HTTP サーバはこの結果をそのまま書き出すだけです。
//!
//! ハンドラは tokio タスクの中で実行し、panic は 500 に変換します。

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

use crate::app::service::{CreateJobRequest, JobService};
use crate::domain::SchedError;
use crate::payment::{Challenge, RESOURCE_HEADER, RequestHeaders};

const CONTENT_TYPE: &str = "content-type";
const JSON: &str = "application/json";

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ApiBody,
}

impl ApiResponse {
    pub fn json(status: u16, body: impl Serialize) -> Self {
        let body = serde_json::to_value(body)
            .unwrap_or_else(|e| json!({ "error": format!("serialization failed: {e}") }));
        Self {
            status,
            headers: vec![(CONTENT_TYPE.to_string(), JSON.to_string())],
            body: ApiBody::Json(body),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![(CONTENT_TYPE.to_string(), "text/plain".to_string())],
            body: ApiBody::Text(body.into()),
        }
    }

    fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// JSON body, or `Null` for text responses.
    pub fn json_body(&self) -> &Value {
        match &self.body {
            ApiBody::Json(v) => v,
            ApiBody::Text(_) => &NULL,
        }
    }

    fn internal_error() -> Self {
        Self::json(500, json!({ "error": "internal server error" }))
    }

    fn from_error(err: &SchedError) -> Self {
        if err.is_client_error() {
            Self::json(400, json!({ "error": err.to_string() }))
        } else {
            error!(error = %err, "request failed");
            Self::internal_error()
        }
    }
}

#[derive(Clone)]
pub struct Boundary {
    service: Arc<JobService>,
    domain_verification: Option<Arc<str>>,
}

impl Boundary {
    pub fn new(service: Arc<JobService>, domain_verification: Option<String>) -> Self {
        Self {
            service,
            domain_verification: domain_verification.map(Arc::from),
        }
    }

    pub fn service(&self) -> &Arc<JobService> {
        &self.service
    }

    /// Discovery path: always 402 with the full challenge.
    pub async fn discover(&self) -> ApiResponse {
        let service = Arc::clone(&self.service);
        guarded(async move {
            let gate = service.gate();
            challenge_response(gate.discovery(), gate.resource_url())
        })
        .await
    }

    /// Job creation. The gate runs before the body is looked at.
    pub async fn create(&self, headers: RequestHeaders, body: Vec<u8>) -> ApiResponse {
        let service = Arc::clone(&self.service);
        guarded(async move {
            if let Err(challenge) = service.authorize(&headers).await {
                return challenge_response(challenge, service.gate().resource_url());
            }
            let request: CreateJobRequest = match serde_json::from_slice(&body) {
                Ok(request) => request,
                Err(e) => {
                    return ApiResponse::from_error(&SchedError::InvalidInput(format!(
                        "body must be {{\"prompt\", \"schedule_hhmm\"}}: {e}"
                    )));
                }
            };
            match service.create(&request.prompt, &request.schedule_hhmm).await {
                Ok(created) => ApiResponse::json(200, created),
                Err(e) => ApiResponse::from_error(&e),
            }
        })
        .await
    }

    /// Status never fails at the transport level for unknown jobs.
    pub async fn status(&self, job_id: String) -> ApiResponse {
        let service = Arc::clone(&self.service);
        guarded(async move {
            match service.status(&job_id).await {
                Ok(view) => ApiResponse::json(200, view),
                Err(SchedError::NotFound(_)) => {
                    ApiResponse::json(200, json!({ "state": "failed", "error": "job not found" }))
                }
                Err(e) => ApiResponse::from_error(&e),
            }
        })
        .await
    }

    pub async fn modify(&self, job_id: String, task_id: String, patch: Value) -> ApiResponse {
        let service = Arc::clone(&self.service);
        guarded(async move { ack(service.modify_task(&job_id, &task_id, &patch).await) }).await
    }

    pub async fn undo(&self, job_id: String, task_id: String) -> ApiResponse {
        let service = Arc::clone(&self.service);
        guarded(async move { ack(service.undo_task(&job_id, &task_id).await) }).await
    }

    pub async fn complete_human(&self, job_id: String, task_id: String, result: Value) -> ApiResponse {
        let service = Arc::clone(&self.service);
        guarded(async move {
            ack(service.complete_human_task(&job_id, &task_id, result).await)
        })
        .await
    }

    pub fn well_known(&self) -> ApiResponse {
        match &self.domain_verification {
            Some(doc) => ApiResponse::text(200, doc.to_string()),
            None => ApiResponse::json(404, json!({ "error": "not found" })),
        }
    }
}

fn challenge_response(challenge: Challenge, resource_url: &str) -> ApiResponse {
    ApiResponse::json(402, challenge).with_header(RESOURCE_HEADER, resource_url)
}

fn ack<T>(result: Result<T, SchedError>) -> ApiResponse {
    match result {
        Ok(_) => ApiResponse::json(200, json!({ "success": true })),
        Err(e) => ApiResponse::from_error(&e),
    }
}

async fn guarded<F>(handler: F) -> ApiResponse
where
    F: Future<Output = ApiResponse> + Send + 'static,
{
    match tokio::spawn(handler).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "request handler panicked");
            ApiResponse::internal_error()
        }
    }
}
