//! Loads `EngineConfig` from `schedoputer.toml`.
//!
//! Missing fields use the core defaults. `SCHEDOPUTER_BASE_URL` and
//! `SCHEDOPUTER_PAY_TO` take precedence over the file.

use std::path::Path;

use anyhow::{Context, Result};
use schedoputer_core::EngineConfig;

pub const DEFAULT_PATH: &str = "schedoputer.toml";
pub const BASE_URL_ENV: &str = "SCHEDOPUTER_BASE_URL";
pub const PAY_TO_ENV: &str = "SCHEDOPUTER_PAY_TO";

/// An explicit `path` must exist; the default path may be absent.
pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => read(path)?,
        None => {
            let default = Path::new(DEFAULT_PATH);
            if default.exists() {
                read(default)?
            } else {
                EngineConfig::default()
            }
        }
    };

    apply_env(&mut config, |key| std::env::var(key).ok());
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn read(path: &Path) -> Result<EngineConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
}

fn apply_env(config: &mut EngineConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(url) = env(BASE_URL_ENV)
        && !url.is_empty()
    {
        config.base_url = url;
    }
    if let Some(pay_to) = env(PAY_TO_ENV)
        && !pay_to.is_empty()
    {
        config.payment.pay_to = pay_to;
    }
}
