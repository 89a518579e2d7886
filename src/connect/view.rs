//! Display values derived from a flow state
//!
//! Nothing here is state; a presentation layer renders a [`FlowView`] and
//! turns user input back into controller intents.

use crate::wallet::{Wallet, WalletAccount};

use super::state::FlowState;

pub const TITLE_CONNECT: &str = "Connect wallet";
pub const TITLE_LOADING: &str = "Loading...";
pub const TITLE_NO_WALLET: &str = "Haven't got a wallet yet?";
pub const NO_WALLET_LINK: &str = "I don't have a wallet";
pub const NO_ACCOUNTS_MESSAGE: &str = "No accounts found.";

/// Placeholder rows shown while accounts load
pub const SKELETON_ROWS: usize = 2;

/// Flow title for a state
pub fn title(state: &FlowState) -> String {
    match state.selected_wallet() {
        None => TITLE_CONNECT.to_string(),
        Some(wallet) if wallet.installed => format!("Select {} account", wallet.title),
        Some(_) if state.loading() == Some(true) => TITLE_LOADING.to_string(),
        Some(_) => TITLE_NO_WALLET.to_string(),
    }
}

/// Main content of the flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewBody {
    /// Flow closed, nothing to draw
    Hidden,
    WalletList(Vec<Wallet>),
    /// Placeholder rows while the account list loads
    AccountSkeleton { rows: usize },
    /// Waiting without an account list to draw
    Waiting,
    InstallPrompt {
        message: String,
        install_url: String,
        label: String,
    },
    NoAccounts { lines: Vec<String> },
    Accounts(Vec<WalletAccount>),
}

/// Everything a presentation layer needs for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowView {
    pub title: String,
    pub body: ViewBody,
    /// A wallet is selected and the user can go back to the list
    pub can_go_back: bool,
    /// The "I don't have a wallet" fallback is offered
    pub show_no_wallet_link: bool,
}

impl FlowView {
    pub fn render(state: &FlowState, wallets: &[Wallet], show_accounts_list: bool) -> Self {
        let body = match state {
            FlowState::Closed => ViewBody::Hidden,
            FlowState::WalletList => ViewBody::WalletList(wallets.to_vec()),
            FlowState::Connecting { .. } if show_accounts_list => ViewBody::AccountSkeleton {
                rows: SKELETON_ROWS,
            },
            FlowState::Connecting { .. } => ViewBody::Waiting,
            FlowState::NeedsExtension { wallet } => ViewBody::InstallPrompt {
                message: wallet.no_extension_message.clone(),
                install_url: wallet.install_url.clone(),
                label: format!("Install {}", wallet.title),
            },
            FlowState::NoAccounts { wallet } => ViewBody::NoAccounts {
                lines: vec![
                    NO_ACCOUNTS_MESSAGE.to_string(),
                    format!("Add an account in {} to get started.", wallet.title),
                ],
            },
            FlowState::AccountsReady { accounts, .. } if show_accounts_list => {
                ViewBody::Accounts(accounts.clone())
            }
            FlowState::AccountsReady { .. } => ViewBody::Waiting,
        };

        let has_wallet = state.selected_wallet().is_some();

        Self {
            title: title(state),
            body,
            can_go_back: has_wallet,
            show_no_wallet_link: state.is_open() && !has_wallet,
        }
    }
}
