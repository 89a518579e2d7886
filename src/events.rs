//! Wallet selection notifications
//!
//! Listeners outside the flow (balance widgets, session restore, ...) learn
//! about a wallet pick through the bus injected into the controller.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::wallet::Wallet;

/// Name of the selection event
pub const WALLET_SELECTED_EVENT: &str = "wallet-select/wallet-selected";

/// A wallet was picked in a flow
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSelected {
    pub flow_id: Uuid,
    pub wallet: Wallet,
    pub selected_at: DateTime<Utc>,
}

impl WalletSelected {
    pub fn new(flow_id: Uuid, wallet: Wallet) -> Self {
        Self {
            flow_id,
            wallet,
            selected_at: Utc::now(),
        }
    }
}

/// Broadcast channel for selection events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WalletSelected>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(16)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to selection events
    pub fn subscribe(&self) -> broadcast::Receiver<WalletSelected> {
        self.sender.subscribe()
    }

    /// Publish a selection. Returns how many listeners received it.
    pub fn publish(&self, event: WalletSelected) -> usize {
        let wallet = event.wallet.extension_name.clone();
        match self.sender.send(event) {
            Ok(listeners) => {
                debug!(event = WALLET_SELECTED_EVENT, %wallet, listeners, "Published");
                listeners
            }
            Err(_) => {
                debug!(event = WALLET_SELECTED_EVENT, %wallet, "No listeners");
                0
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
