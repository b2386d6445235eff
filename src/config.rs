//! Configuration management for the storage gateway
//!
//! Settings are read from an optional config file and then overridden by
//! environment variables prefixed with `STORAGE_GATEWAY_`
//! (e.g. `STORAGE_GATEWAY_BASE_PATH`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lock::BackendKind;

/// Config file names tried by [`GatewayConfig::load`], without extension.
const CONFIG_NAMES: [&str; 2] = ["storage-gateway", "config"];

/// Complete gateway configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Directory every event is confined to. Must already exist to be useful.
    pub base_path: String,

    /// How long a write waits for its exclusive lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Upper bound on tokio's blocking pool (file opens, lock waits, writes)
    #[serde(default = "default_max_blocking_threads")]
    pub max_blocking_threads: usize,

    /// Locking backend: `auto`, `native` or `portable`
    #[serde(default)]
    pub lock_backend: BackendKind,
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_max_blocking_threads() -> usize {
    16
}

impl GatewayConfig {
    /// Load `storage-gateway.*` or `config.*` from the working directory, with environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        for name in CONFIG_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
        Self::finish(builder.add_source(Environment::with_prefix("STORAGE_GATEWAY")))
    }

    /// Load from an explicit config file, with environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::finish(
            Config::builder()
                .add_source(File::from(path))
                .add_source(Environment::with_prefix("STORAGE_GATEWAY")),
        )
    }

    fn finish(
        builder: config::builder::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config: GatewayConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_path.trim().is_empty() {
            return Err(ConfigError::Message("base_path cannot be empty".into()));
        }

        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "lock_timeout_ms must be greater than 0".into(),
            ));
        }

        if self.max_blocking_threads == 0 {
            return Err(ConfigError::Message(
                "max_blocking_threads must be greater than 0".into(),
            ));
        }

        if self.lock_backend.backend().is_none() {
            return Err(ConfigError::Message(format!(
                "lock_backend {:?} is not available on this platform",
                self.lock_backend
            )));
        }

        Ok(())
    }

    /// Get base path as PathBuf
    pub fn base_path(&self) -> PathBuf {
        PathBuf::from(&self.base_path)
    }

    /// Get lock timeout as Duration
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
