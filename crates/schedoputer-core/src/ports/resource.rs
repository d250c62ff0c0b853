//! ResourceInvoker port - タスクが呼び出す外部リソースの抽象化
//!
//! research / LLM / SNS 投稿などの具体的なエンドポイントはこの trait の
//! 実装側に閉じ込めます。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{ErrorKind, JobId, ResourceRef, TaskKey};

/// One invocation of an external capability on behalf of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCall {
    pub job_id: JobId,
    pub task: TaskKey,
    pub resource: ResourceRef,

    /// `{ prompt, task, params, input? }`
    pub payload: Value,
}

#[derive(Debug, Error)]
pub enum InvocationError {
    /// The resource itself answered 402; retried on a later tick.
    #[error("resource demanded payment")]
    PaymentRequired,

    #[error("resource call timed out")]
    Timeout,

    #[error("resource rate limited the call")]
    RateLimited,

    #[error("resource rejected the call (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("no endpoint configured for resource {0}")]
    Unroutable(ResourceRef),

    #[error("malformed resource response: {0}")]
    Malformed(String),
}

impl InvocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InvocationError::PaymentRequired
            | InvocationError::Timeout
            | InvocationError::RateLimited => ErrorKind::Transient,
            InvocationError::Rejected { .. }
            | InvocationError::Network(_)
            | InvocationError::Unroutable(_)
            | InvocationError::Malformed(_) => ErrorKind::Fatal,
        }
    }
}

#[async_trait]
pub trait ResourceInvoker: Send + Sync {
    async fn invoke(&self, call: &ResourceCall) -> Result<Value, InvocationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::payment(InvocationError::PaymentRequired, ErrorKind::Transient)]
    #[case::timeout(InvocationError::Timeout, ErrorKind::Transient)]
    #[case::rate_limited(InvocationError::RateLimited, ErrorKind::Transient)]
    #[case::rejected(InvocationError::Rejected { status: 500, message: "x".into() }, ErrorKind::Fatal)]
    #[case::network(InvocationError::Network("refused".into()), ErrorKind::Fatal)]
    #[case::unroutable(InvocationError::Unroutable(ResourceRef::new("nope")), ErrorKind::Fatal)]
    #[case::malformed(InvocationError::Malformed("not json".into()), ErrorKind::Fatal)]
    fn classifies_errors(#[case] err: InvocationError, #[case] kind: ErrorKind) {
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InvocationError>();
    }
}
