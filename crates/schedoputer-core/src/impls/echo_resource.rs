//! EchoResourceInvoker - ネットワークを使わないローカル実装
//!
//! CLI のシミュレーションで使います。入力（なければ prompt）をそのまま返します。

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::ports::{InvocationError, ResourceCall, ResourceInvoker};

#[derive(Debug, Clone, Copy, Default)]
pub struct EchoResourceInvoker;

#[async_trait]
impl ResourceInvoker for EchoResourceInvoker {
    async fn invoke(&self, call: &ResourceCall) -> Result<Value, InvocationError> {
        let source = call
            .payload
            .get("input")
            .or_else(|| call.payload.get("prompt"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(json!({ "text": format!("{}: {}", call.resource, source) }))
    }
}
