//! PaymentGate - x402 のチャレンジ／レスポンス
//!
//! リクエストヘッダーに支払い証明があれば `Authorized`、なければ
//! `PaymentRequired(Challenge)` を返します。ゲート自体は失敗しません。

use serde_json::{Value, json};
use tracing::info;

use crate::config::PaymentConfig;
use crate::payment::{Challenge, PaymentProof, PaymentRequirements, RequestHeaders};

pub const RESOURCE_HEADER: &str = "x402-resource";

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Authorized(PaymentProof),
    PaymentRequired(Challenge),
}

#[derive(Debug, Clone)]
pub struct PaymentGate {
    requirements: PaymentRequirements,
    accepted_headers: Vec<String>,
    currency: String,
    decimals: u32,
    service_name: String,
}

impl PaymentGate {
    /// `origin` is the public base URL without a trailing slash.
    pub fn new(config: &PaymentConfig, origin: &str) -> Self {
        let resource = format!("{}{}", origin.trim_end_matches('/'), config.resource_path);
        Self {
            requirements: PaymentRequirements {
                scheme: "exact".to_string(),
                network: config.network.clone(),
                asset: config.asset.clone(),
                max_amount_required: config.max_amount_required.clone(),
                pay_to: config.pay_to.clone(),
                resource,
                mime_type: "application/json".to_string(),
                max_timeout_seconds: config.max_timeout_seconds,
                description: config.description.clone(),
                output_schema: None,
                extra: None,
            },
            accepted_headers: config
                .accepted_headers
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            currency: config.currency.clone(),
            decimals: config.asset_decimals,
            service_name: config.service_name.clone(),
        }
    }

    /// Canonical URL of the protected resource.
    pub fn resource_url(&self) -> &str {
        &self.requirements.resource
    }

    pub fn requirements(&self) -> &PaymentRequirements {
        &self.requirements
    }

    pub fn check(&self, headers: &RequestHeaders) -> GateDecision {
        let found = self.accepted_headers.iter().find_map(|name| {
            headers
                .get(name)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (name, v))
        });

        match found {
            Some((name, value)) => {
                info!(
                    outcome = "authorized",
                    resource = %self.requirements.resource,
                    header = %name,
                    "payment proof present"
                );
                GateDecision::Authorized(PaymentProof {
                    header: name.clone(),
                    value: value.to_string(),
                })
            }
            None => {
                info!(
                    outcome = "payment_required",
                    resource = %self.requirements.resource,
                    header = "none",
                    "no payment proof, issuing challenge"
                );
                GateDecision::PaymentRequired(self.enforcement())
            }
        }
    }

    /// Challenge returned in place of job creation.
    pub fn enforcement(&self) -> Challenge {
        Challenge::new(self.requirements.clone())
    }

    /// Challenge served on the discovery path, with schema and pricing.
    pub fn discovery(&self) -> Challenge {
        let mut requirements = self.requirements.clone();
        requirements.output_schema = Some(output_schema());
        requirements.extra = Some(self.extra());
        Challenge::new(requirements)
    }

    fn extra(&self) -> Value {
        let mut extra = json!({ "serviceName": self.service_name });
        if let Some(amount) = display_amount(&self.requirements.max_amount_required, self.decimals) {
            extra["pricing"] = json!({
                "amount": amount,
                "currency": self.currency,
                "network": capitalize(&self.requirements.network),
            });
        }
        extra
    }
}

fn output_schema() -> Value {
    json!({
        "input": {
            "type": "http",
            "method": "POST",
            "bodyType": "json",
            "bodyFields": {
                "prompt": {
                    "type": "string",
                    "required": true,
                    "description": "What the workflow should write about"
                },
                "schedule_hhmm": {
                    "type": "string",
                    "required": true,
                    "description": "Delay before the job starts, as H:M"
                }
            }
        },
        "output": {
            "success": { "type": "boolean" },
            "jobId": { "type": "string" },
            "scheduledFor": { "type": "string", "format": "date-time" },
            "statusUrl": { "type": "string" }
        }
    })
}

/// `"10000"` with 6 decimals -> `0.01`.
fn display_amount(minor: &str, decimals: u32) -> Option<f64> {
    let minor: u64 = minor.parse().ok()?;
    Some(minor as f64 / 10f64.powi(decimals as i32))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gate() -> PaymentGate {
        let config = PaymentConfig {
            pay_to: "Wallet111".into(),
            ..PaymentConfig::default()
        };
        PaymentGate::new(&config, "https://sched.example/")
    }

    #[rstest]
    #[case::authorization("Authorization", "Bearer x")]
    #[case::x_payment("x-payment", "proof")]
    #[case::signature("X-PAYMENT-SIGNATURE", "sig")]
    fn any_accepted_header_authorizes(#[case] name: &str, #[case] value: &str) {
        let headers = RequestHeaders::new().with(name, value);
        match gate().check(&headers) {
            GateDecision::Authorized(proof) => {
                assert_eq!(proof.header, name.to_ascii_lowercase());
                assert_eq!(proof.value, value);
            }
            other => panic!("expected Authorized, got {other:?}"),
        }
    }

    #[rstest]
    #[case::no_headers(RequestHeaders::new())]
    #[case::blank_value(RequestHeaders::new().with("x-payment", ""))]
    #[case::unrelated(RequestHeaders::new().with("content-type", "application/json"))]
    fn missing_proof_yields_challenge(#[case] headers: RequestHeaders) {
        let GateDecision::PaymentRequired(challenge) = gate().check(&headers) else {
            panic!("expected PaymentRequired");
        };
        assert_eq!(challenge.x402_version, 1);
        let req = &challenge.accepts[0];
        assert_eq!(req.scheme, "exact");
        assert_eq!(req.max_amount_required, "10000");
        assert_eq!(req.pay_to, "Wallet111");
        assert_eq!(req.resource, "https://sched.example/x402/solana/schedoputer");
    }

    #[test]
    fn configured_header_list_is_respected() {
        let config = PaymentConfig {
            accepted_headers: vec!["X-Custom-Proof".into()],
            ..PaymentConfig::default()
        };
        let gate = PaymentGate::new(&config, "http://h");

        let x_payment = RequestHeaders::new().with("x-payment", "proof");
        assert!(matches!(gate.check(&x_payment), GateDecision::PaymentRequired(_)));

        let custom = RequestHeaders::new().with("x-custom-proof", "proof");
        assert!(matches!(gate.check(&custom), GateDecision::Authorized(_)));
    }

    #[test]
    fn discovery_carries_schema_and_pricing() {
        let challenge = gate().discovery();
        let body = serde_json::to_value(&challenge).unwrap();
        let req = &body["accepts"][0];

        assert_eq!(req["extra"]["serviceName"], "Schedoputer");
        assert_eq!(req["extra"]["pricing"]["amount"], 0.01);
        assert_eq!(req["extra"]["pricing"]["currency"], "USDC");
        assert_eq!(req["extra"]["pricing"]["network"], "Solana");
        assert_eq!(req["outputSchema"]["input"]["method"], "POST");
        assert_eq!(req["description"], "Schedoputer AI Workflow");
    }

    #[test]
    fn enforcement_matches_discovery_requirements() {
        let gate = gate();
        let discovery = &gate.discovery().accepts[0];
        let enforcement = &gate.enforcement().accepts[0];
        assert_eq!(discovery.max_amount_required, enforcement.max_amount_required);
        assert_eq!(discovery.pay_to, enforcement.pay_to);
        assert_eq!(discovery.resource, enforcement.resource);
        assert!(enforcement.extra.is_none());
    }
}
