//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! 時刻・ID 生成・ジョブの保存先・外部リソース・支払い証明の検証を
//! trait の向こう側に置き、scheduler と service はこれらにだけ依存します。

pub mod clock;
pub mod id_generator;
pub mod job_store;
pub mod proof_verifier;
pub mod resource;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::job_store::{JobHandle, JobStore};
pub use self::proof_verifier::{PresenceVerifier, ProofVerifier, Verification};
pub use self::resource::{InvocationError, ResourceCall, ResourceInvoker};
