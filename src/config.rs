//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::error::Error;

/// Upper bound for the simulated feed delay
const MAX_FEED_DELAY_MS: u64 = 60_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connect: ConnectConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Connection flow behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectConfig {
    /// Show the account list after a wallet is picked.
    /// When off, picking an installed wallet closes the flow immediately.
    #[serde(default = "default_true")]
    pub show_accounts_list: bool,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            show_accounts_list: true,
        }
    }
}

/// Where the last selected wallet is remembered
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    File,
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Known wallets registry
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_path")]
    pub path: String,
    /// Delay before a registry wallet reports its accounts
    #[serde(default = "default_feed_delay_ms")]
    pub feed_delay_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
            feed_delay_ms: default_feed_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_storage_path() -> String {
    "state/selection.json".into()
}

fn default_registry_path() -> String {
    std::env::var("WALLET_REGISTRY").unwrap_or_else(|_| "wallets.json".into())
}

fn default_feed_delay_ms() -> u64 {
    300
}

fn default_channel_capacity() -> usize {
    16
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("connect.show_accounts_list", true)?
            .set_default("storage.path", default_storage_path())?
            .set_default("registry.path", default_registry_path())?
            .set_default("registry.feed_delay_ms", default_feed_delay_ms() as i64)?
            .set_default("events.channel_capacity", default_channel_capacity() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix WALLET_SELECT_)
            .add_source(
                config::Environment::with_prefix("WALLET_SELECT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.storage.backend == StorageBackend::File && self.storage.path.trim().is_empty() {
            return Err(Error::Config(
                "storage.path cannot be empty with the file backend".into(),
            )
            .into());
        }

        if self.registry.path.trim().is_empty() {
            return Err(Error::Config("registry.path cannot be empty".into()).into());
        }

        if self.registry.feed_delay_ms > MAX_FEED_DELAY_MS {
            return Err(Error::Config(format!(
                "registry.feed_delay_ms cannot exceed {}ms, got {}",
                MAX_FEED_DELAY_MS, self.registry.feed_delay_ms
            ))
            .into());
        }

        if self.events.channel_capacity == 0 {
            return Err(Error::Config("events.channel_capacity must be positive".into()).into());
        }

        if self.storage.backend == StorageBackend::Memory {
            tracing::warn!("Storage backend is 'memory' - the last selected wallet will not survive a restart");
        }

        Ok(())
    }

    /// Human-readable summary
    pub fn display(&self) -> String {
        format!(
            r#"Configuration:
  Connect:
    Show accounts list: {}
  Storage:
    Backend: {}
    Path: {}
  Registry:
    Path: {}
    Feed delay: {}ms
  Events:
    Channel capacity: {}"#,
            self.connect.show_accounts_list,
            self.storage.backend,
            self.storage.path,
            self.registry.path,
            self.registry.feed_delay_ms,
            self.events.channel_capacity,
        )
    }
}
