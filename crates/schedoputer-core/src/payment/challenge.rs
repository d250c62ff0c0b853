//! x402 challenge wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const X402_VERSION: u32 = 1;

/// One way of paying for the protected resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    pub asset: String,

    /// Integer amount in the asset's minor units, as a string.
    pub max_amount_required: String,

    pub pay_to: String,
    pub resource: String,
    pub mime_type: String,
    pub max_timeout_seconds: u64,
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// Body of a 402 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub x402_version: u32,
    pub accepts: Vec<PaymentRequirements>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Challenge {
    pub fn new(requirements: PaymentRequirements) -> Self {
        Self {
            x402_version: X402_VERSION,
            accepts: vec![requirements],
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Proof of payment copied off the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProof {
    /// Lower-cased name of the header that carried it.
    pub header: String,
    pub value: String,
}
