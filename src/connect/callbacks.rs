//! Host notifications
//!
//! Every callback is optional; an unset one is a no-op.

use crate::wallet::{Wallet, WalletAccount};

type WalletsCallback = Box<dyn FnMut(&[Wallet]) + Send>;
type CloseCallback = Box<dyn FnMut() + Send>;
type WalletCallback = Box<dyn FnMut(&Wallet) + Send>;
type AccountsCallback = Box<dyn FnMut(Option<&[WalletAccount]>) + Send>;
type AccountCallback = Box<dyn FnMut(&WalletAccount) + Send>;

/// Callbacks the host application registers on a flow
#[derive(Default)]
pub struct HostCallbacks {
    on_open: Option<WalletsCallback>,
    on_close: Option<CloseCallback>,
    on_wallet_selected: Option<WalletCallback>,
    on_accounts_updated: Option<AccountsCallback>,
    on_account_selected: Option<AccountCallback>,
}

impl HostCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flow opened with the fetched wallet list
    pub fn on_open(mut self, f: impl FnMut(&[Wallet]) + Send + 'static) -> Self {
        self.on_open = Some(Box::new(f));
        self
    }

    pub fn on_close(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }

    pub fn on_wallet_selected(mut self, f: impl FnMut(&Wallet) + Send + 'static) -> Self {
        self.on_wallet_selected = Some(Box::new(f));
        self
    }

    /// Current feed reported accounts; `None` when the feed failed
    pub fn on_accounts_updated(
        mut self,
        f: impl FnMut(Option<&[WalletAccount]>) + Send + 'static,
    ) -> Self {
        self.on_accounts_updated = Some(Box::new(f));
        self
    }

    pub fn on_account_selected(mut self, f: impl FnMut(&WalletAccount) + Send + 'static) -> Self {
        self.on_account_selected = Some(Box::new(f));
        self
    }

    pub(crate) fn opened(&mut self, wallets: &[Wallet]) {
        if let Some(f) = self.on_open.as_mut() {
            f(wallets);
        }
    }

    pub(crate) fn closed(&mut self) {
        if let Some(f) = self.on_close.as_mut() {
            f();
        }
    }

    pub(crate) fn wallet_selected(&mut self, wallet: &Wallet) {
        if let Some(f) = self.on_wallet_selected.as_mut() {
            f(wallet);
        }
    }

    pub(crate) fn accounts_updated(&mut self, accounts: Option<&[WalletAccount]>) {
        if let Some(f) = self.on_accounts_updated.as_mut() {
            f(accounts);
        }
    }

    pub(crate) fn account_selected(&mut self, account: &WalletAccount) {
        if let Some(f) = self.on_account_selected.as_mut() {
            f(account);
        }
    }
}

impl std::fmt::Debug for HostCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCallbacks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_wallet_selected", &self.on_wallet_selected.is_some())
            .field("on_accounts_updated", &self.on_accounts_updated.is_some())
            .field("on_account_selected", &self.on_account_selected.is_some())
            .finish()
    }
}
