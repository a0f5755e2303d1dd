//! Configuration management for the Shopstock engine
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. An optional `shopstock.toml` configuration file
//! 3. Environment variable overrides with SHOPSTOCK_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::Scope;

/// Main engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Store scope selection (local single-shop vs. shared central)
    pub scope: ScopeConfig,

    /// Ledger tuning
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScopeConfig {
    /// "local" or "central"
    pub mode: String,

    /// Shop identifier, required in local mode
    pub shop_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    /// How long a writer may wait for the ledger lock before the
    /// operation fails with a concurrency error
    pub lock_timeout_ms: u64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .set_default("scope.mode", "local")?
            .set_default("scope.shop_id", "default")?
            .set_default("ledger.lock_timeout_ms", 2_000i64)?
            .add_source(File::with_name("shopstock").required(false))
            .add_source(Environment::with_prefix("SHOPSTOCK").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Resolve the configured storage scope
    pub fn scope(&self) -> Result<Scope, ConfigError> {
        match self.scope.mode.as_str() {
            "central" => Ok(Scope::Central),
            "local" => {
                let shop_id = self
                    .scope
                    .shop_id
                    .clone()
                    .ok_or_else(|| ConfigError::Message("scope.shop_id is required in local mode".to_string()))?;
                Ok(Scope::Local(shop_id))
            }
            other => Err(ConfigError::Message(format!("unknown scope mode: {}", other))),
        }
    }

    pub fn lock_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ledger.lock_timeout_ms)
    }
}
