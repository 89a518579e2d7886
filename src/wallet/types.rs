//! Core types for wallet discovery
//!
//! Defines wallets, their accounts, and the wallets.json registry format.

use serde::{Deserialize, Serialize};

/// Wallet logo reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletLogo {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// A browser-extension wallet as reported by a provider
///
/// Immutable for the duration of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Unique identifier: "talisman", "polkadot-js"
    pub extension_name: String,

    /// Human-readable name: "Talisman"
    pub title: String,

    pub logo: WalletLogo,

    /// Where the extension can be installed from
    pub install_url: String,

    /// Shown when the extension is missing
    #[serde(default)]
    pub no_extension_message: String,

    /// Whether the extension is present
    #[serde(default)]
    pub installed: bool,
}

impl Wallet {
    /// Label used in the wallet list
    pub fn list_label(&self) -> String {
        if self.installed {
            self.title.clone()
        } else {
            format!("Try {}", self.title)
        }
    }

    /// Keep only the accounts owned by this wallet
    pub fn own_accounts(&self, accounts: &[WalletAccount]) -> Vec<WalletAccount> {
        accounts
            .iter()
            .filter(|account| account.belongs_to(self))
            .cloned()
            .collect()
    }
}

impl std::fmt::Display for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension_name)
    }
}

/// An account reported by a wallet's feed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletAccount {
    /// Owning wallet's extension name
    pub source: String,

    /// Unique within `source`
    pub address: String,

    #[serde(default)]
    pub name: String,
}

impl WalletAccount {
    pub fn new(source: impl Into<String>, address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            address: address.into(),
            name: name.into(),
        }
    }

    pub fn belongs_to(&self, wallet: &Wallet) -> bool {
        self.source == wallet.extension_name
    }

    /// Identity across all wallets
    pub fn key(&self) -> String {
        format!("{}-{}", self.source, self.address)
    }
}

/// Account entry in wallets.json (source is implied by the wallet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAccount {
    pub address: String,
    #[serde(default)]
    pub name: String,
}

/// Wallet entry in wallets.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(flatten)]
    pub wallet: Wallet,

    /// Accounts the extension reports once subscribed
    #[serde(default)]
    pub accounts: Vec<RegistryAccount>,
}

impl RegistryEntry {
    /// Accounts tagged with this entry's wallet as their source
    pub fn wallet_accounts(&self) -> Vec<WalletAccount> {
        self.accounts
            .iter()
            .map(|a| WalletAccount::new(&self.wallet.extension_name, &a.address, &a.name))
            .collect()
    }
}

/// Wallet registry file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryFile {
    /// Registry format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Known wallets, in display order
    pub wallets: Vec<RegistryEntry>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for RegistryFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            wallets: Vec::new(),
        }
    }
}
