//! Engine configuration.
//!
//! Every field has a serde default, so a partial TOML file (or none at all)
//! yields a working configuration. Loading the file is the binary's job.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::retry::RetryPolicy;

/// USDC mint on Solana mainnet.
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base_url must not be empty")]
    EmptyBaseUrl,

    #[error("payment.max_amount_required must be an integer minor-unit string, got {0:?}")]
    InvalidAmount(String),

    #[error("scheduler.tick_interval_secs must be greater than zero")]
    ZeroTickInterval,

    #[error("scheduler.invoke_timeout_secs must be greater than zero")]
    ZeroInvokeTimeout,

    #[error("payment.accepted_headers must list at least one header")]
    NoAcceptedHeaders,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Public origin the service is reachable at; used for resource and status URLs.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub payment: PaymentConfig,

    #[serde(default)]
    pub resources: ResourceConfig,

    /// Body of the well-known domain verification document, if any.
    #[serde(default)]
    pub domain_verification: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            scheduler: SchedulerConfig::default(),
            payment: PaymentConfig::default(),
            resources: ResourceConfig::default(),
            domain_verification: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        let amount = &self.payment.max_amount_required;
        if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::InvalidAmount(amount.clone()));
        }
        if self.payment.accepted_headers.is_empty() {
            return Err(ConfigError::NoAcceptedHeaders);
        }
        if self.scheduler.tick_interval_secs == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.scheduler.invoke_timeout_secs == 0 {
            return Err(ConfigError::ZeroInvokeTimeout);
        }
        Ok(())
    }

    /// `base_url` without a trailing slash.
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// What happens to blocked dependents when a task is undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPropagation {
    /// Dependents stay `blocked`.
    #[default]
    None,
    /// Every transitive dependent still `blocked` is cancelled too.
    Cascade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Upper bound on a single external resource call.
    #[serde(default = "default_invoke_timeout_secs")]
    pub invoke_timeout_secs: u64,

    #[serde(default)]
    pub cancel_propagation: CancelPropagation,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_tick_interval_secs() -> u64 {
    30
}

fn default_invoke_timeout_secs() -> u64 {
    20
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            invoke_timeout_secs: default_invoke_timeout_secs(),
            cancel_propagation: CancelPropagation::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_secs(self.invoke_timeout_secs)
    }
}

/// Backoff between attempts after a transient resource failure.
///
/// `base_delay_ms = 0` retries on the very next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub base_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    10 * 60 * 1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 0,
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms),
            multiplier: self.multiplier,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Path of the protected resource, appended to `base_url`.
    #[serde(default = "default_resource_path")]
    pub resource_path: String,

    #[serde(default = "default_network")]
    pub network: String,

    #[serde(default = "default_asset")]
    pub asset: String,

    /// Display currency of `asset`, used in the discovery pricing block.
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_asset_decimals")]
    pub asset_decimals: u32,

    #[serde(default)]
    pub pay_to: String,

    /// Integer amount in the asset's minor units.
    #[serde(default = "default_max_amount_required")]
    pub max_amount_required: String,

    #[serde(default = "default_max_timeout_seconds")]
    pub max_timeout_seconds: u64,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Request headers that carry payment proof (case-insensitive).
    #[serde(default = "default_accepted_headers")]
    pub accepted_headers: Vec<String>,
}

fn default_resource_path() -> String {
    "/x402/solana/schedoputer".to_string()
}

fn default_network() -> String {
    "solana".to_string()
}

fn default_asset() -> String {
    USDC_MINT.to_string()
}

fn default_currency() -> String {
    "USDC".to_string()
}

fn default_asset_decimals() -> u32 {
    6
}

fn default_max_amount_required() -> String {
    // $0.01 USDC
    "10000".to_string()
}

fn default_max_timeout_seconds() -> u64 {
    60
}

fn default_description() -> String {
    "Schedoputer AI Workflow".to_string()
}

fn default_service_name() -> String {
    "Schedoputer".to_string()
}

fn default_accepted_headers() -> Vec<String> {
    vec![
        "authorization".to_string(),
        "x-payment".to_string(),
        "x-payment-signature".to_string(),
    ]
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            resource_path: default_resource_path(),
            network: default_network(),
            asset: default_asset(),
            currency: default_currency(),
            asset_decimals: default_asset_decimals(),
            pay_to: String::new(),
            max_amount_required: default_max_amount_required(),
            max_timeout_seconds: default_max_timeout_seconds(),
            description: default_description(),
            service_name: default_service_name(),
            accepted_headers: default_accepted_headers(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource ref (e.g. `llm.draft`) -> endpoint URL.
    #[serde(default)]
    pub endpoints: HashMap<String, String>,

    /// Proof attached as `X-PAYMENT` when calling pay-per-call resources.
    #[serde(default)]
    pub payment_proof: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}
