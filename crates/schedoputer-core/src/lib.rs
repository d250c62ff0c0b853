//! schedoputer-core
//!
//! x402 で課金されるマルチステップ・ワークフローのスケジューラ。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, job, task, graph, dependency, delay, state, errors）
//! - **payment**: x402 のチャレンジ／レスポンス（PaymentGate, Challenge）
//! - **ports**: 抽象化レイヤー（JobStore, ResourceInvoker, ProofVerifier, Clock, IdGenerator）
//! - **impls**: 実装（InMemoryJobStore, HttpResourceInvoker, EchoResourceInvoker）
//! - **app**: アプリケーションロジック（scheduler, dispatch, mutation, service, boundary, builder）
//! - **config**: serde デフォルト付きの設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod payment;
pub mod ports;

pub use app::{App, AppBuilder, ApiResponse, Boundary, Scheduler};
pub use config::EngineConfig;
