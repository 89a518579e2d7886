//! Connection controller
//!
//! Owns the flow state and the single current account subscription.
//! Sequence: open → select wallet → account feed → select account.
//!
//! # Freshness
//!
//! Every feed message carries the [`SubscriptionId`] it was opened with.
//! Only messages from the current subscription are applied; anything from
//! a superseded or cancelled feed is dropped, so a slow first wallet can
//! never overwrite the state of a wallet selected after it.
//!
//! # Cleanup
//!
//! Selecting another wallet, closing, and dropping the controller all
//! cancel the current subscription first.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ConnectConfig;
use crate::error::{Error, Result};
use crate::events::{EventBus, WalletSelected};
use crate::storage::{PersistenceAdapter, SELECTED_WALLET_KEY};
use crate::subscription::{
    AccountSink, AccountSubscriber, CancelHandle, FeedEvent, FeedMessage, SubscriptionId,
};
use crate::wallet::{Wallet, WalletAccount, WalletProvider};

use super::callbacks::HostCallbacks;
use super::state::FlowState;
use super::view::{self, FlowView};

/// The feed currently allowed to update the flow
struct ActiveSubscription {
    id: SubscriptionId,
    wallet: Wallet,
    token: CancellationToken,
    handle: Option<CancelHandle>,
}

impl ActiveSubscription {
    fn cancel(&self) {
        self.token.cancel();
        if let Some(handle) = &self.handle {
            handle.cancel();
        }
    }
}

/// Drives one wallet connection flow
pub struct ConnectionController {
    flow_id: Uuid,
    config: ConnectConfig,
    provider: Arc<dyn WalletProvider>,
    subscriber: Arc<dyn AccountSubscriber>,
    storage: Arc<dyn PersistenceAdapter>,
    events: EventBus,
    callbacks: HostCallbacks,

    state: FlowState,
    wallets: Option<Vec<Wallet>>,
    current: Option<ActiveSubscription>,
    last_subscription: SubscriptionId,

    feed_tx: mpsc::UnboundedSender<FeedMessage>,
    feed_rx: mpsc::UnboundedReceiver<FeedMessage>,

    released: bool,
}

impl ConnectionController {
    /// Create a controller (mount). Forgets a remembered wallet that is no
    /// longer installed.
    pub fn new(
        config: ConnectConfig,
        provider: Arc<dyn WalletProvider>,
        subscriber: Arc<dyn AccountSubscriber>,
        storage: Arc<dyn PersistenceAdapter>,
    ) -> Self {
        let (feed_tx, feed_rx) = mpsc::unbounded_channel();

        let controller = Self {
            flow_id: Uuid::new_v4(),
            config,
            provider,
            subscriber,
            storage,
            events: EventBus::default(),
            callbacks: HostCallbacks::default(),
            state: FlowState::Closed,
            wallets: None,
            current: None,
            last_subscription: SubscriptionId::new(0),
            feed_tx,
            feed_rx,
            released: false,
        };

        debug!(flow = %controller.flow_id, "Connection controller created");
        controller.purge_stale_selection();
        controller
    }

    /// Publish selections on `events` instead of a private bus
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn with_callbacks(mut self, callbacks: HostCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    // ---------------------------------------------------------------------
    // Intents
    // ---------------------------------------------------------------------

    /// Open the flow and fetch the wallet list
    ///
    /// An empty list is not an error.
    pub fn open(&mut self) -> &[Wallet] {
        self.purge_stale_selection();

        let wallets = self.provider.wallets();
        if wallets.is_empty() {
            warn!(flow = %self.flow_id, "Wallet provider returned no wallets");
        }

        if !self.state.is_open() {
            self.state = FlowState::WalletList;
        }

        info!(flow = %self.flow_id, wallets = wallets.len(), "Flow opened");
        self.callbacks.opened(&wallets);
        self.wallets = Some(wallets);

        self.wallets()
    }

    /// Pick a wallet and start listening for its accounts
    ///
    /// In order: the previous feed is cancelled, the selection is recorded
    /// and reported, the wallet name is persisted, the selection event is
    /// published, then the new feed is opened.
    pub async fn select_wallet(&mut self, wallet: Wallet) -> Result<()> {
        if !self.state.is_open() {
            return Err(Error::FlowClosed);
        }

        self.release_subscription();

        info!(
            flow = %self.flow_id,
            wallet = %wallet,
            installed = wallet.installed,
            "Wallet selected"
        );

        self.state = FlowState::Connecting {
            wallet: wallet.clone(),
        };
        self.callbacks.wallet_selected(&wallet);

        if !self.config.show_accounts_list && wallet.installed {
            // The host learns about the pick through on_wallet_selected only
            info!(flow = %self.flow_id, "Account list disabled, hiding flow");
            self.state = FlowState::Closed;
        }

        self.remember(&wallet);
        self.events
            .publish(WalletSelected::new(self.flow_id, wallet.clone()));

        self.subscribe(wallet).await;
        Ok(())
    }

    /// "I don't have a wallet": select the first listed wallet
    pub async fn select_first_wallet(&mut self) -> Result<()> {
        if !self.state.is_open() {
            return Err(Error::FlowClosed);
        }

        let wallet = self
            .wallets
            .as_ref()
            .and_then(|wallets| wallets.first())
            .cloned()
            .ok_or(Error::NoWallets)?;

        debug!(flow = %self.flow_id, wallet = %wallet, "Falling back to first wallet");
        self.select_wallet(wallet).await
    }

    /// Pick an account from the ready list. Reports it and closes the flow.
    pub fn select_account(&mut self, account: &WalletAccount) -> Result<WalletAccount> {
        let chosen = match &self.state {
            FlowState::AccountsReady { accounts, .. } => accounts
                .iter()
                .find(|a| *a == account)
                .cloned()
                .ok_or_else(|| {
                    Error::InvalidSelection(format!("{} is not listed", account.key()))
                })?,
            other => {
                return Err(Error::InvalidSelection(format!(
                    "no account list while {}",
                    other
                )))
            }
        };

        info!(flow = %self.flow_id, account = %chosen.key(), "Account selected");
        self.callbacks.account_selected(&chosen);
        self.close();

        Ok(chosen)
    }

    /// Return to the wallet list. The current feed stays open.
    pub fn back(&mut self) -> Result<()> {
        let wallet = self
            .state
            .selected_wallet()
            .map(|w| w.extension_name.clone())
            .ok_or_else(|| Error::InvalidTransition("no wallet selected".into()))?;

        debug!(flow = %self.flow_id, %wallet, "Back to wallet list");
        self.state = FlowState::WalletList;
        Ok(())
    }

    /// Close the flow, cancelling the current feed
    pub fn close(&mut self) {
        self.release_subscription();
        self.close_flow();
    }

    /// Release everything (unmount). Also runs on drop.
    pub fn teardown(mut self) {
        self.release();
    }

    // ---------------------------------------------------------------------
    // Feed handling
    // ---------------------------------------------------------------------

    /// Wait for the next feed message and apply it
    ///
    /// Returns whether the message was applied. Waits indefinitely if no
    /// feed ever reports.
    pub async fn process_next(&mut self) -> bool {
        match self.feed_rx.recv().await {
            Some(msg) => self.apply(msg),
            None => false,
        }
    }

    /// Apply every message already queued. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.feed_rx.try_recv() {
            if self.apply(msg) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply one feed message if it comes from the current subscription
    pub fn apply(&mut self, msg: FeedMessage) -> bool {
        let is_current = matches!(
            &self.current,
            Some(current) if current.id == msg.subscription && !current.token.is_cancelled()
        );

        if !is_current {
            debug!(
                flow = %self.flow_id,
                subscription = %msg.subscription,
                "Dropping update from stale subscription"
            );
            return false;
        }

        match msg.event {
            FeedEvent::Accounts(accounts) => self.accounts_received(accounts),
            FeedEvent::Failed(reason) => self.feed_failed(reason),
        }

        true
    }

    async fn subscribe(&mut self, wallet: Wallet) {
        let id = self.last_subscription.next();
        self.last_subscription = id;

        let token = CancellationToken::new();
        let sink = AccountSink::new(id, self.feed_tx.clone(), token.clone());

        self.current = Some(ActiveSubscription {
            id,
            wallet: wallet.clone(),
            token,
            handle: None,
        });

        let result = self.subscriber.subscribe_accounts(&wallet, sink).await;
        match result {
            Ok(handle) => match self.current.as_mut() {
                Some(current) if current.id == id => {
                    debug!(flow = %self.flow_id, subscription = %id, wallet = %wallet, "Account feed opened");
                    current.handle = Some(handle);
                }
                _ => {
                    handle.cancel();
                }
            },
            Err(e) => {
                warn!(flow = %self.flow_id, wallet = %wallet, "Account subscription failed: {}", e);
                self.feed_failed(e.to_string());
            }
        }
    }

    fn accounts_received(&mut self, accounts: Vec<WalletAccount>) {
        debug!(flow = %self.flow_id, accounts = accounts.len(), "Accounts received");
        self.callbacks.accounts_updated(Some(&accounts));

        if let Some(wallet) = self.shown_feed_wallet() {
            self.state = FlowState::settled(wallet, &accounts);
            info!(flow = %self.flow_id, state = %self.state, "Accounts settled");
        }
    }

    /// Settle as if the feed reported nothing; the feed is released
    fn feed_failed(&mut self, reason: String) {
        warn!(flow = %self.flow_id, "Account feed failed: {}", reason);
        self.callbacks.accounts_updated(None);

        if let Some(wallet) = self.shown_feed_wallet() {
            self.state = FlowState::settled(wallet, &[]);
            info!(flow = %self.flow_id, state = %self.state, "Settled after feed failure");
        }

        self.release_subscription();
    }

    /// Selected wallet, if it is the one the current feed belongs to
    fn shown_feed_wallet(&self) -> Option<Wallet> {
        let current = self.current.as_ref()?;
        self.state
            .selected_wallet()
            .filter(|w| w.extension_name == current.wallet.extension_name)
            .cloned()
    }

    fn release_subscription(&mut self) {
        if let Some(subscription) = self.current.take() {
            debug!(
                flow = %self.flow_id,
                subscription = %subscription.id,
                wallet = %subscription.wallet,
                "Cancelling account feed"
            );
            subscription.cancel();
        }
    }

    fn close_flow(&mut self) {
        if !self.state.is_open() {
            return;
        }

        self.state = FlowState::Closed;
        info!(flow = %self.flow_id, "Flow closed");
        self.callbacks.closed();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.close();
        debug!(flow = %self.flow_id, "Connection controller released");
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    fn remember(&self, wallet: &Wallet) {
        if let Err(e) = self.storage.set(SELECTED_WALLET_KEY, &wallet.extension_name) {
            warn!(flow = %self.flow_id, wallet = %wallet, "Failed to remember wallet: {}", e);
        }
    }

    /// Forget the remembered wallet if it is not installed
    fn purge_stale_selection(&self) {
        let stored = match self.storage.get(SELECTED_WALLET_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(flow = %self.flow_id, "Failed to read remembered wallet: {}", e);
                return;
            }
        };

        if let Some(name) = stored {
            if !self.provider.is_installed(Some(&name)) {
                info!(flow = %self.flow_id, wallet = %name, "Forgetting wallet that is no longer installed");
                if let Err(e) = self.storage.remove(SELECTED_WALLET_KEY) {
                    warn!(flow = %self.flow_id, "Failed to forget wallet: {}", e);
                }
            }
        }
    }

    /// Remembered wallet, if it is still installed
    pub fn last_selected_wallet(&self) -> Option<Wallet> {
        self.purge_stale_selection();

        let name = self.storage.get(SELECTED_WALLET_KEY).ok().flatten()?;
        self.provider.find(&name).filter(|w| w.installed)
    }

    pub fn forget_selected_wallet(&self) -> Result<()> {
        self.storage.remove(SELECTED_WALLET_KEY)
    }

    // ---------------------------------------------------------------------
    // Read access
    // ---------------------------------------------------------------------

    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Wallets fetched by the last `open()`
    pub fn wallets(&self) -> &[Wallet] {
        self.wallets.as_deref().unwrap_or(&[])
    }

    pub fn current_subscription(&self) -> Option<SubscriptionId> {
        self.current.as_ref().map(|c| c.id)
    }

    pub fn show_accounts_list(&self) -> bool {
        self.config.show_accounts_list
    }

    pub fn title(&self) -> String {
        view::title(&self.state)
    }

    pub fn view(&self) -> FlowView {
        FlowView::render(&self.state, self.wallets(), self.config.show_accounts_list)
    }
}

impl Drop for ConnectionController {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::testing::{
        account, broken_storage_controller, harness, harness_with, wallet_x, wallet_y, Harness,
    };
    use crate::connect::view::ViewBody;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_scenario_pick_account() {
        let Harness {
            mut controller,
            subscriber,
            recorder,
            ..
        } = harness(true);

        assert_eq!(controller.open().len(), 2);
        assert!(matches!(controller.state(), FlowState::WalletList));
        assert_eq!(controller.title(), "Connect wallet");

        controller.select_wallet(wallet_x()).await.unwrap();
        assert!(matches!(controller.state(), FlowState::Connecting { .. }));
        assert_eq!(
            controller.view().body,
            ViewBody::AccountSkeleton { rows: 2 }
        );

        let acc = account("X", "addr1", "Acc1");
        assert!(subscriber.deliver("X", vec![acc.clone()]));
        assert_eq!(controller.pump(), 1);

        assert_eq!(
            controller.state(),
            &FlowState::AccountsReady {
                wallet: wallet_x(),
                accounts: vec![acc.clone()],
            }
        );
        assert_eq!(controller.title(), "Select Wallet X account");

        let chosen = controller.select_account(&acc).unwrap();
        assert_eq!(chosen, acc);
        assert!(matches!(controller.state(), FlowState::Closed));
        assert_eq!(
            recorder.events(),
            vec!["open:2", "wallet:X", "accounts:1", "account:addr1", "close"]
        );
        assert_eq!(subscriber.cancel_count("X"), 1);
    }

    #[tokio::test]
    async fn test_scenario_missing_extension() {
        let Harness {
            mut controller,
            subscriber,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_y()).await.unwrap();
        assert_eq!(controller.title(), "Loading...");

        assert!(subscriber.deliver("Y", Vec::new()));
        controller.pump();

        assert!(matches!(controller.state(), FlowState::NeedsExtension { .. }));
        assert_eq!(controller.title(), "Haven't got a wallet yet?");
        match controller.view().body {
            ViewBody::InstallPrompt { install_url, .. } => {
                assert_eq!(install_url, wallet_y().install_url)
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scenario_switch_before_first_feed_reports() {
        let Harness {
            mut controller,
            subscriber,
            recorder,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();
        let x_sink = subscriber.sink("X").unwrap();
        let x_id = controller.current_subscription().unwrap();

        controller.select_wallet(wallet_y()).await.unwrap();

        // Late report through the cancelled feed
        assert!(!x_sink.deliver(vec![account("X", "addr1", "Acc1")]));
        // Or a message that slipped past the sink
        let applied = controller.apply(FeedMessage {
            subscription: x_id,
            event: FeedEvent::Accounts(vec![account("X", "addr1", "Acc1")]),
        });
        assert!(!applied);

        assert_eq!(
            controller.state(),
            &FlowState::Connecting { wallet: wallet_y() }
        );
        assert_eq!(recorder.count("accounts:"), 0);
    }

    #[tokio::test]
    async fn test_queued_update_from_previous_wallet_is_dropped() {
        let Harness {
            mut controller,
            subscriber,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();

        // X reports, but the update is still queued when the user switches
        assert!(subscriber.deliver("X", vec![account("X", "addr1", "Acc1")]));
        controller.select_wallet(wallet_y()).await.unwrap();

        assert_eq!(controller.pump(), 0);
        assert_eq!(
            controller.state(),
            &FlowState::Connecting { wallet: wallet_y() }
        );

        assert!(subscriber.deliver("Y", Vec::new()));
        assert_eq!(controller.pump(), 1);
        assert!(matches!(
            controller.state(),
            FlowState::NeedsExtension { wallet } if wallet.extension_name == "Y"
        ));
    }

    #[tokio::test]
    async fn test_previous_feed_cancelled_before_next_opens() {
        let Harness {
            mut controller,
            subscriber,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();
        controller.select_wallet(wallet_y()).await.unwrap();
        controller.select_wallet(wallet_x()).await.unwrap();

        assert_eq!(
            subscriber.log(),
            vec![
                "persist X", "open X", "cancel X", "persist Y", "open Y", "cancel Y", "persist X",
                "open X",
            ]
        );
        assert_eq!(subscriber.cancel_count("Y"), 1);
    }

    #[tokio::test]
    async fn test_remembers_selected_wallet() {
        let Harness {
            mut controller,
            storage,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();

        assert_eq!(
            storage.get(SELECTED_WALLET_KEY).unwrap().as_deref(),
            Some("X")
        );
        assert_eq!(controller.last_selected_wallet(), Some(wallet_x()));
    }

    #[tokio::test]
    async fn test_open_forgets_uninstalled_wallet() {
        let Harness {
            mut controller,
            storage,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_y()).await.unwrap();
        assert_eq!(
            storage.get(SELECTED_WALLET_KEY).unwrap().as_deref(),
            Some("Y")
        );

        controller.close();
        controller.open();
        assert_eq!(storage.get(SELECTED_WALLET_KEY).unwrap(), None);
        assert_eq!(controller.last_selected_wallet(), None);
    }

    #[test]
    fn test_mount_forgets_unknown_wallet() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(SELECTED_WALLET_KEY, "removed-extension").unwrap();

        let _harness = harness_with(vec![wallet_x()], true, storage.clone());
        assert_eq!(storage.get(SELECTED_WALLET_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_auto_close_without_account_list() {
        let Harness {
            mut controller,
            subscriber,
            recorder,
            ..
        } = harness(false);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();

        // Closed before any account report
        assert!(matches!(controller.state(), FlowState::Closed));
        assert_eq!(recorder.events(), vec!["open:2", "wallet:X"]);

        // The feed keeps the host informed in the background
        assert!(controller.current_subscription().is_some());
        assert!(subscriber.deliver("X", vec![account("X", "addr1", "Acc1")]));
        assert_eq!(controller.pump(), 1);
        assert_eq!(recorder.count("accounts:1"), 1);
        assert!(matches!(controller.state(), FlowState::Closed));

        // Selecting needs an open flow again
        let err = controller.select_wallet(wallet_x()).await.unwrap_err();
        assert!(err.is_contract_violation());

        // Teardown still releases the background feed, without a close notification
        controller.teardown();
        assert_eq!(subscriber.cancel_count("X"), 1);
        assert_eq!(recorder.count("close"), 0);
    }

    #[tokio::test]
    async fn test_missing_extension_waits_even_without_account_list() {
        let Harness { mut controller, .. } = harness(false);

        controller.open();
        controller.select_wallet(wallet_y()).await.unwrap();
        assert!(matches!(controller.state(), FlowState::Connecting { .. }));
        assert_eq!(controller.view().body, ViewBody::Waiting);
    }

    #[tokio::test]
    async fn test_close_twice_then_teardown() {
        let Harness {
            mut controller,
            subscriber,
            recorder,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();

        controller.close();
        controller.close();
        controller.teardown();

        assert_eq!(subscriber.cancel_count("X"), 1);
        assert_eq!(recorder.count("close"), 1);
    }

    #[tokio::test]
    async fn test_drop_mid_flight_releases_feed() {
        let Harness {
            mut controller,
            subscriber,
            recorder,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();
        let sink = subscriber.sink("X").unwrap();

        drop(controller);

        assert_eq!(subscriber.cancel_count("X"), 1);
        assert_eq!(recorder.count("close"), 1);
        assert!(!sink.deliver(vec![account("X", "addr1", "Acc1")]));
    }

    #[tokio::test]
    async fn test_cancels_even_after_accounts_arrived() {
        let Harness {
            mut controller,
            subscriber,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();
        subscriber.deliver("X", vec![account("X", "addr1", "Acc1")]);
        controller.pump();

        controller.close();
        assert_eq!(subscriber.cancel_count("X"), 1);
        assert!(!subscriber.deliver("X", Vec::new()));
    }

    #[tokio::test]
    async fn test_back_keeps_feed_open() {
        let Harness {
            mut controller,
            subscriber,
            recorder,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();
        controller.back().unwrap();

        assert!(matches!(controller.state(), FlowState::WalletList));
        assert_eq!(subscriber.cancel_count("X"), 0);

        // Reports still reach the host but do not leave the list
        assert!(subscriber.deliver("X", vec![account("X", "addr1", "Acc1")]));
        assert_eq!(controller.pump(), 1);
        assert_eq!(recorder.count("accounts:1"), 1);
        assert!(matches!(controller.state(), FlowState::WalletList));

        assert!(matches!(
            controller.back(),
            Err(Error::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_select_account_requires_ready_list() {
        let Harness {
            mut controller,
            subscriber,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();

        let acc = account("X", "addr1", "Acc1");
        assert!(matches!(
            controller.select_account(&acc),
            Err(Error::InvalidSelection(_))
        ));

        subscriber.deliver("X", vec![acc]);
        controller.pump();

        let stranger = account("X", "addr9", "Nobody");
        assert!(matches!(
            controller.select_account(&stranger),
            Err(Error::InvalidSelection(_))
        ));
        assert!(controller.state().is_open());
    }

    #[tokio::test]
    async fn test_foreign_accounts_are_not_shown() {
        let Harness {
            mut controller,
            subscriber,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();
        subscriber.deliver("X", vec![account("Y", "addr2", "Acc2")]);
        controller.pump();

        assert!(matches!(controller.state(), FlowState::NoAccounts { .. }));
        assert!(controller.state().accounts().is_empty());
    }

    #[tokio::test]
    async fn test_subscription_failure_settles() {
        let Harness {
            mut controller,
            subscriber,
            recorder,
            ..
        } = harness(true);

        subscriber.fail_for("X");
        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();

        assert!(matches!(controller.state(), FlowState::NoAccounts { .. }));
        assert_eq!(controller.state().loading(), Some(false));
        assert_eq!(recorder.count("accounts:none"), 1);
        assert!(controller.current_subscription().is_none());

        // Recoverable by selecting again
        controller.back().unwrap();
        controller.select_wallet(wallet_y()).await.unwrap();
        assert!(matches!(controller.state(), FlowState::Connecting { .. }));
    }

    #[tokio::test]
    async fn test_feed_failure_after_open_settles() {
        let Harness {
            mut controller,
            subscriber,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_y()).await.unwrap();
        assert!(subscriber.sink("Y").unwrap().fail("extension crashed"));
        assert_eq!(controller.pump(), 1);

        assert!(matches!(controller.state(), FlowState::NeedsExtension { .. }));
        assert_eq!(subscriber.cancel_count("Y"), 1);
    }

    #[tokio::test]
    async fn test_select_first_wallet() {
        let Harness {
            mut controller,
            subscriber,
            ..
        } = harness(true);

        assert!(matches!(
            controller.select_first_wallet().await,
            Err(Error::FlowClosed)
        ));

        controller.open();
        controller.select_first_wallet().await.unwrap();
        assert_eq!(
            controller.state(),
            &FlowState::Connecting { wallet: wallet_x() }
        );
        assert_eq!(subscriber.log(), vec!["persist X", "open X"]);
    }

    #[tokio::test]
    async fn test_empty_wallet_list() {
        let Harness { mut controller, .. } =
            harness_with(Vec::new(), true, Arc::new(MemoryStorage::new()));

        assert!(controller.open().is_empty());
        assert_eq!(controller.view().body, ViewBody::WalletList(Vec::new()));
        assert!(matches!(
            controller.select_first_wallet().await,
            Err(Error::NoWallets)
        ));
    }

    #[tokio::test]
    async fn test_selection_is_broadcast() {
        let Harness {
            mut controller,
            events,
            ..
        } = harness(true);
        let mut rx = events.subscribe();

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.wallet, wallet_x());
        assert_eq!(event.flow_id, controller.flow_id());
    }

    #[tokio::test]
    async fn test_process_next_waits_for_feed() {
        let Harness {
            mut controller,
            subscriber,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();

        let sink = subscriber.sink("X").unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            sink.deliver(vec![account("X", "addr1", "Acc1")]);
        });

        assert!(controller.process_next().await);
        assert!(matches!(controller.state(), FlowState::AccountsReady { .. }));
    }

    #[tokio::test]
    async fn test_process_next_pending_until_feed_reports() {
        use tokio_test::{assert_pending, assert_ready, task};

        let Harness {
            mut controller,
            subscriber,
            ..
        } = harness(true);

        controller.open();
        controller.select_wallet(wallet_x()).await.unwrap();

        let mut next = task::spawn(controller.process_next());
        assert_pending!(next.poll());

        subscriber.deliver("X", vec![account("X", "addr1", "Acc1")]);
        assert!(next.is_woken());
        assert!(assert_ready!(next.poll()));
        drop(next);

        assert_eq!(controller.state().accounts().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failures_do_not_block_the_flow() {
        let (mut controller, subscriber, recorder) = broken_storage_controller();

        assert_eq!(controller.open().len(), 2);
        controller.select_wallet(wallet_x()).await.unwrap();
        assert_eq!(subscriber.log(), vec!["open X"]);

        assert!(subscriber.deliver("X", vec![account("X", "addr1", "Acc1")]));
        assert_eq!(controller.pump(), 1);

        assert!(matches!(controller.state(), FlowState::AccountsReady { .. }));
        assert_eq!(recorder.events(), vec!["open:2", "wallet:X", "accounts:1"]);
        assert_eq!(controller.last_selected_wallet(), None);
        assert!(controller.forget_selected_wallet().is_err());
    }
}
