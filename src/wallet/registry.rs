//! File-backed wallet registry
//!
//! Loads known wallets from wallets.json. Also stands in for the
//! extensions themselves: subscribing to a registry wallet reports the
//! accounts listed for it after a short delay.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::subscription::{AccountSink, AccountSubscriber, CancelHandle};

use super::provider::WalletProvider;
use super::types::{RegistryEntry, RegistryFile, Wallet};

const EXTENSION_NAME_PATTERN: &str = r"^[a-z0-9][a-z0-9._-]*$";

/// Known wallets and the accounts each reports
pub struct WalletRegistry {
    entries: Vec<RegistryEntry>,
    feed_delay: Duration,
}

impl WalletRegistry {
    /// Load registry from a wallets.json file
    pub fn load(path: &Path, feed_delay: Duration) -> Result<Self> {
        let registry = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Registry(format!("Failed to read {}: {}", path.display(), e)))?;

            serde_json::from_str::<RegistryFile>(&content)
                .map_err(|e| Error::Registry(format!("Failed to parse {}: {}", path.display(), e)))?
        } else {
            warn!("{} not found, using empty wallet registry", path.display());
            RegistryFile::default()
        };

        let registry = Self::from_entries(registry.wallets, feed_delay)?;
        info!("Loaded {} wallet entries", registry.entries.len());
        Ok(registry)
    }

    /// Build from entries, validating extension names
    pub fn from_entries(entries: Vec<RegistryEntry>, feed_delay: Duration) -> Result<Self> {
        let pattern = Regex::new(EXTENSION_NAME_PATTERN)
            .map_err(|e| Error::Internal(format!("Invalid extension name pattern: {}", e)))?;

        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            let name = &entry.wallet.extension_name;
            if !pattern.is_match(name) {
                return Err(Error::Registry(format!("Invalid extension name: {:?}", name)));
            }
            if !seen.insert(name.clone()) {
                return Err(Error::Registry(format!("Duplicate extension name: {}", name)));
            }
        }

        Ok(Self { entries, feed_delay })
    }

    pub fn entry(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.wallet.extension_name == name)
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }
}

impl WalletProvider for WalletRegistry {
    fn wallets(&self) -> Vec<Wallet> {
        self.entries.iter().map(|e| e.wallet.clone()).collect()
    }
}

#[async_trait]
impl AccountSubscriber for WalletRegistry {
    async fn subscribe_accounts(&self, wallet: &Wallet, sink: AccountSink) -> Result<CancelHandle> {
        let entry = self
            .entry(&wallet.extension_name)
            .ok_or_else(|| Error::WalletNotFound(wallet.extension_name.clone()))?;

        // A missing extension has nothing to report
        let accounts = if entry.wallet.installed {
            entry.wallet_accounts()
        } else {
            Vec::new()
        };

        let delay = self.feed_delay;
        let token = sink.token();
        let name = wallet.extension_name.clone();

        let handle = CancelHandle::new(sink.token());

        debug!(wallet = %name, subscription = %sink.id(), "Opening registry account feed");

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if sink.deliver(accounts) {
                        debug!(wallet = %name, subscription = %sink.id(), "Registry accounts delivered");
                    }
                }
                _ = token.cancelled() => {
                    debug!(wallet = %name, subscription = %sink.id(), "Registry feed cancelled before delivery");
                    return;
                }
            }

            // Stay subscribed until released
            token.cancelled().await;
            debug!(wallet = %name, subscription = %sink.id(), "Registry feed closed");
        });

        Ok(handle)
    }
}
