//! App - アプリケーション層
//!
//! ports を組み合わせてジョブのライフサイクルを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: 設定と実装のワイヤリング
//! - **JobService**: 作成・照会・変更
//! - **Scheduler**: 定期 tick と per-job dispatch
//! - **Boundary**: トランスポート非依存のレスポンス変換

pub mod boundary;
pub mod builder;
pub mod dispatch;
pub mod mutation;
pub mod retry;
pub mod scheduler;
pub mod service;

pub use self::boundary::{ApiBody, ApiResponse, Boundary};
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::dispatch::{DispatchOutcome, DispatchReport, Dispatches};
pub use self::retry::RetryPolicy;
pub use self::scheduler::{Scheduler, SchedulerHandle, TickReport};
pub use self::service::{CreateJobRequest, CreateOutcome, JobCreated, JobService};
