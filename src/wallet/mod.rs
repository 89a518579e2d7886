//! Wallet discovery
//!
//! Provides the wallet and account types, the provider contract, and a
//! wallets.json registry:
//! - Wallet metadata (title, logo, install URL, installed flag)
//! - Accounts tagged with their owning wallet
//! - Registry-backed discovery and simulated account feeds

pub mod provider;
pub mod registry;
pub mod types;

pub use provider::WalletProvider;
pub use registry::WalletRegistry;
pub use types::{RegistryAccount, RegistryEntry, RegistryFile, Wallet, WalletAccount, WalletLogo};
