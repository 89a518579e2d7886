//! Account feed contract
//!
//! A subscriber pushes account lists into an [`AccountSink`]. Every message
//! is tagged with the subscription that produced it so the receiving side
//! can drop updates from superseded feeds.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;
use crate::wallet::{Wallet, WalletAccount};

use super::handle::{CancelHandle, SubscriptionId};

/// What a feed reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Latest full account list
    Accounts(Vec<WalletAccount>),
    /// The feed gave up; no further updates will follow
    Failed(String),
}

/// Feed event tagged with its subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMessage {
    pub subscription: SubscriptionId,
    pub event: FeedEvent,
}

/// Write side of an account feed
#[derive(Debug, Clone)]
pub struct AccountSink {
    id: SubscriptionId,
    tx: mpsc::UnboundedSender<FeedMessage>,
    token: CancellationToken,
}

impl AccountSink {
    pub fn new(
        id: SubscriptionId,
        tx: mpsc::UnboundedSender<FeedMessage>,
        token: CancellationToken,
    ) -> Self {
        Self { id, tx, token }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Cancelled when the subscription is released
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.tx.is_closed()
    }

    /// Report the current accounts. Returns false once the feed is released.
    pub fn deliver(&self, accounts: Vec<WalletAccount>) -> bool {
        self.send(FeedEvent::Accounts(accounts))
    }

    /// Report a terminal failure
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.send(FeedEvent::Failed(reason.into()))
    }

    fn send(&self, event: FeedEvent) -> bool {
        if self.token.is_cancelled() {
            debug!(subscription = %self.id, "Feed released, update not sent");
            return false;
        }

        self.tx
            .send(FeedMessage {
                subscription: self.id,
                event,
            })
            .is_ok()
    }
}

/// Per-wallet account subscription capability
#[async_trait]
pub trait AccountSubscriber: Send + Sync {
    /// Open a live feed of `wallet`'s accounts into `sink`
    ///
    /// Must return once the feed is established; updates arrive later
    /// through the sink.
    async fn subscribe_accounts(&self, wallet: &Wallet, sink: AccountSink) -> Result<CancelHandle>;
}
