//! Wallet discovery contract

use super::types::Wallet;

/// Enumerates installed and known wallets
///
/// Discovery itself is a black box; the flow only consumes the list.
pub trait WalletProvider: Send + Sync {
    /// Known wallets, in display order. Already resolved at call time.
    fn wallets(&self) -> Vec<Wallet>;

    /// Whether the named wallet is installed. `None` is never installed.
    fn is_installed(&self, name: Option<&str>) -> bool {
        match name {
            Some(name) => self
                .wallets()
                .iter()
                .any(|w| w.extension_name == name && w.installed),
            None => false,
        }
    }

    /// Look a wallet up by extension name
    fn find(&self, name: &str) -> Option<Wallet> {
        self.wallets().into_iter().find(|w| w.extension_name == name)
    }
}
