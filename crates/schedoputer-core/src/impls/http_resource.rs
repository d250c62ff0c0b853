//! HttpResourceInvoker - reqwest で外部リソースを呼び出す
//!
//! `ResourceRef` ごとにエンドポイント URL を設定から引き、payload を JSON で
//! POST します。ステータスコードは `InvocationError` に写像します。

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::ResourceConfig;
use crate::ports::{InvocationError, ResourceCall, ResourceInvoker};

pub const PAYMENT_HEADER: &str = "X-PAYMENT";

pub struct HttpResourceInvoker {
    client: Client,
    endpoints: HashMap<String, String>,
    payment_proof: Option<String>,
}

impl HttpResourceInvoker {
    /// `timeout` bounds the whole request; the scheduler's own timeout still applies on top.
    pub fn new(config: &ResourceConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoints: config.endpoints.clone(),
            payment_proof: config.payment_proof.clone(),
        })
    }
}

#[async_trait]
impl ResourceInvoker for HttpResourceInvoker {
    async fn invoke(&self, call: &ResourceCall) -> Result<Value, InvocationError> {
        let url = self
            .endpoints
            .get(call.resource.as_str())
            .ok_or_else(|| InvocationError::Unroutable(call.resource.clone()))?;

        let mut request = self.client.post(url).json(&call.payload);
        if let Some(proof) = &self.payment_proof {
            request = request.header(PAYMENT_HEADER, proof);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        debug!(
            job_id = %call.job_id,
            task = %call.task,
            resource = %call.resource,
            status = status.as_u16(),
            "resource responded"
        );

        if status == StatusCode::PAYMENT_REQUIRED {
            return Err(InvocationError::PaymentRequired);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(InvocationError::RateLimited);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(InvocationError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| InvocationError::Malformed(e.to_string()))
    }
}

fn map_transport_error(err: reqwest::Error) -> InvocationError {
    if err.is_timeout() {
        InvocationError::Timeout
    } else {
        InvocationError::Network(err.to_string())
    }
}
