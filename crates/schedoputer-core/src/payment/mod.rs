//! x402 payment gate.

pub mod challenge;
pub mod gate;
pub mod headers;

pub use self::challenge::{Challenge, PaymentProof, PaymentRequirements, X402_VERSION};
pub use self::gate::{GateDecision, PaymentGate, RESOURCE_HEADER};
pub use self::headers::RequestHeaders;
