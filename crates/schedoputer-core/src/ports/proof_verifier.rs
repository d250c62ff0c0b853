//! ProofVerifier port - 支払い証明の検証
//!
//! ゲートはヘッダーに証明があるかどうかだけを見ます。暗号学的な検証
//! （facilitator への問い合わせなど）はこの trait の実装に任せます。

use async_trait::async_trait;

use crate::payment::{PaymentProof, PaymentRequirements};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid,
    Invalid(String),
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }
}

#[async_trait]
pub trait ProofVerifier: Send + Sync {
    async fn verify(&self, proof: &PaymentProof, requirements: &PaymentRequirements)
    -> Verification;
}

/// Accepts any non-empty proof.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceVerifier;

#[async_trait]
impl ProofVerifier for PresenceVerifier {
    async fn verify(
        &self,
        proof: &PaymentProof,
        _requirements: &PaymentRequirements,
    ) -> Verification {
        if proof.value.trim().is_empty() {
            Verification::Invalid("empty payment proof".to_string())
        } else {
            Verification::Valid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaymentConfig;
    use crate::payment::PaymentGate;

    #[tokio::test]
    async fn presence_verifier_accepts_any_value() {
        let gate = PaymentGate::new(&PaymentConfig::default(), "http://localhost:3000");
        let proof = PaymentProof {
            header: "x-payment".into(),
            value: "opaque".into(),
        };
        assert_eq!(
            PresenceVerifier.verify(&proof, gate.requirements()).await,
            Verification::Valid
        );
    }

    #[tokio::test]
    async fn presence_verifier_rejects_blank_value() {
        let gate = PaymentGate::new(&PaymentConfig::default(), "http://localhost:3000");
        let proof = PaymentProof {
            header: "x-payment".into(),
            value: "  ".into(),
        };
        assert!(!PresenceVerifier.verify(&proof, gate.requirements()).await.is_valid());
    }
}
