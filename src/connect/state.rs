//! Flow states
//!
//! One tagged value holds everything the flow knows about the current
//! selection, so accounts can never exist without the wallet they were
//! received for.

use crate::wallet::{Wallet, WalletAccount};

/// Where a connection flow is
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    /// Nothing held
    #[default]
    Closed,

    /// Flow open, no wallet chosen
    WalletList,

    /// Wallet chosen, waiting for its first account report
    Connecting { wallet: Wallet },

    /// Chosen wallet is not installed
    NeedsExtension { wallet: Wallet },

    /// Chosen wallet is installed but reported none of its own accounts
    NoAccounts { wallet: Wallet },

    /// Chosen wallet reported accounts; holds only the ones it owns
    AccountsReady {
        wallet: Wallet,
        accounts: Vec<WalletAccount>,
    },
}

impl FlowState {
    /// Settled state for `wallet` once its feed reported `accounts`
    ///
    /// Accounts owned by other wallets are discarded. A missing extension
    /// always prompts for installation.
    pub fn settled(wallet: Wallet, accounts: &[WalletAccount]) -> Self {
        if !wallet.installed {
            return FlowState::NeedsExtension { wallet };
        }

        let accounts = wallet.own_accounts(accounts);
        if accounts.is_empty() {
            FlowState::NoAccounts { wallet }
        } else {
            FlowState::AccountsReady { wallet, accounts }
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, FlowState::Closed)
    }

    pub fn selected_wallet(&self) -> Option<&Wallet> {
        match self {
            FlowState::Closed | FlowState::WalletList => None,
            FlowState::Connecting { wallet }
            | FlowState::NeedsExtension { wallet }
            | FlowState::NoAccounts { wallet }
            | FlowState::AccountsReady { wallet, .. } => Some(wallet),
        }
    }

    /// `None` before any feed was requested, `Some(true)` while waiting,
    /// `Some(false)` once settled
    pub fn loading(&self) -> Option<bool> {
        match self {
            FlowState::Closed | FlowState::WalletList => None,
            FlowState::Connecting { .. } => Some(true),
            FlowState::NeedsExtension { .. }
            | FlowState::NoAccounts { .. }
            | FlowState::AccountsReady { .. } => Some(false),
        }
    }

    /// Accounts shown for the selected wallet
    pub fn accounts(&self) -> &[WalletAccount] {
        match self {
            FlowState::AccountsReady { accounts, .. } => accounts,
            _ => &[],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Closed => "closed",
            FlowState::WalletList => "wallet_list",
            FlowState::Connecting { .. } => "connecting",
            FlowState::NeedsExtension { .. } => "needs_extension",
            FlowState::NoAccounts { .. } => "no_accounts",
            FlowState::AccountsReady { .. } => "accounts_ready",
        }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.selected_wallet() {
            Some(wallet) => write!(f, "{}({})", self.name(), wallet),
            None => write!(f, "{}", self.name()),
        }
    }
}
