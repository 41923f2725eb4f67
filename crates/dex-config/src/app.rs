//! Typed configuration view.
//!
//! Every field has a default, so an empty document is a valid config.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_BATCH_SIZE: u64 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    pub sync: SyncConfig,
    pub catalog: CatalogConfig,
    pub store: StoreConfig,
    pub daemon: DaemonConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pokeapi.co/api/v2".to_string(),
            timeout_secs: 10,
            user_agent: concat!("dexsync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Entities fetched by the startup bootstrap.
    pub bootstrap_target: u64,
    /// Page size; values above 50 are clamped.
    pub batch_size: u64,
    pub batch_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            bootstrap_target: 300,
            batch_size: MAX_BATCH_SIZE,
            batch_delay_ms: 500,
        }
    }
}

impl SyncConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub language: String,
    pub price_min: i64,
    pub price_max: i64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            language: "es".to_string(),
            price_min: 1_000,
            price_max: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// NAME of the env var carrying the database URL.
    pub database_url_env: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url_env: "DEX_DATABASE_URL".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub addr: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8899".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json(v: &Value) -> Result<Self> {
        let mut cfg: AppConfig =
            serde_json::from_value(v.clone()).context("config does not match AppConfig shape")?;
        cfg.sync.batch_size = cfg.sync.batch_size.clamp(1, MAX_BATCH_SIZE);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.catalog;
        if c.price_min <= 0 || c.price_min > c.price_max {
            bail!(
                "CONFIG_INVALID catalog price range [{}, {}]: need 0 < price_min <= price_max",
                c.price_min,
                c.price_max
            );
        }
        if c.language.trim().is_empty() {
            bail!("CONFIG_INVALID catalog.language is empty");
        }
        if self.upstream.base_url.trim().is_empty() {
            bail!("CONFIG_INVALID upstream.base_url is empty");
        }
        if self.store.database_url_env.trim().is_empty() {
            bail!("CONFIG_INVALID store.database_url_env is empty");
        }
        Ok(())
    }
}
