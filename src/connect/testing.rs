//! Test doubles for the connection flow

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::ConnectConfig;
use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::storage::{MemoryStorage, PersistenceAdapter};
use crate::subscription::{AccountSink, AccountSubscriber, CancelHandle};
use crate::wallet::{Wallet, WalletAccount, WalletLogo, WalletProvider};

use super::callbacks::HostCallbacks;
use super::controller::ConnectionController;

pub fn wallet_x() -> Wallet {
    Wallet {
        extension_name: "X".into(),
        title: "Wallet X".into(),
        logo: WalletLogo {
            src: "/logos/x.svg".into(),
            alt: "Wallet X Logo".into(),
        },
        install_url: "https://example.com/install/x".into(),
        no_extension_message: "Wallet X is not installed".into(),
        installed: true,
    }
}

pub fn wallet_y() -> Wallet {
    Wallet {
        extension_name: "Y".into(),
        title: "Wallet Y".into(),
        logo: WalletLogo {
            src: "/logos/y.svg".into(),
            alt: "Wallet Y Logo".into(),
        },
        install_url: "https://example.com/install/y".into(),
        no_extension_message: "Wallet Y is not installed".into(),
        installed: false,
    }
}

pub fn account(source: &str, address: &str, name: &str) -> WalletAccount {
    WalletAccount::new(source, address, name)
}

/// Fixed wallet list
pub struct StaticProvider {
    wallets: Vec<Wallet>,
}

impl WalletProvider for StaticProvider {
    fn wallets(&self) -> Vec<Wallet> {
        self.wallets.clone()
    }
}

type Log = Arc<Mutex<Vec<String>>>;

/// Subscriber whose feeds report only when a test says so
///
/// Records "open {wallet}" and "cancel {wallet}" in a shared log.
#[derive(Clone, Default)]
pub struct ScriptedSubscriber {
    log: Log,
    sinks: Arc<Mutex<Vec<(String, AccountSink)>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl ScriptedSubscriber {
    pub fn fail_for(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn cancel_count(&self, name: &str) -> usize {
        let entry = format!("cancel {}", name);
        self.log().iter().filter(|e| **e == entry).count()
    }

    /// Latest sink opened for `name`
    pub fn sink(&self, name: &str) -> Option<AccountSink> {
        self.sinks
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, sink)| sink.clone())
    }

    /// Report through the latest feed for `name`
    pub fn deliver(&self, name: &str, accounts: Vec<WalletAccount>) -> bool {
        self.sink(name).map(|s| s.deliver(accounts)).unwrap_or(false)
    }
}

#[async_trait]
impl AccountSubscriber for ScriptedSubscriber {
    async fn subscribe_accounts(&self, wallet: &Wallet, sink: AccountSink) -> Result<CancelHandle> {
        let name = wallet.extension_name.clone();
        self.log.lock().unwrap().push(format!("open {}", name));

        if self.failing.lock().unwrap().contains(&name) {
            return Err(Error::Subscription {
                wallet: name,
                reason: "extension rejected the request".into(),
            });
        }

        self.sinks.lock().unwrap().push((name.clone(), sink.clone()));

        let log = self.log.clone();
        Ok(CancelHandle::with_hook(sink.token(), move || {
            log.lock().unwrap().push(format!("cancel {}", name));
        }))
    }
}

/// Memory storage that records writes in the subscriber's log
pub struct LoggedStorage {
    inner: Arc<MemoryStorage>,
    log: Log,
}

impl PersistenceAdapter for LoggedStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("persist {}", value));
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.log.lock().unwrap().push("remove".to_string());
        self.inner.remove(key)
    }
}

/// Storage whose every call fails
pub struct BrokenStorage;

impl PersistenceAdapter for BrokenStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::Storage("disk unavailable".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Storage("disk unavailable".into()))
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(Error::Storage("disk unavailable".into()))
    }
}

/// Host callbacks that record what they were told
#[derive(Clone, Default)]
pub struct Recorder {
    events: Log,
}

impl Recorder {
    pub fn callbacks(&self) -> HostCallbacks {
        let open = self.events.clone();
        let close = self.events.clone();
        let wallet = self.events.clone();
        let accounts = self.events.clone();
        let account = self.events.clone();

        HostCallbacks::new()
            .on_open(move |w| open.lock().unwrap().push(format!("open:{}", w.len())))
            .on_close(move || close.lock().unwrap().push("close".to_string()))
            .on_wallet_selected(move |w| {
                wallet
                    .lock()
                    .unwrap()
                    .push(format!("wallet:{}", w.extension_name))
            })
            .on_accounts_updated(move |a| {
                let entry = match a {
                    Some(a) => format!("accounts:{}", a.len()),
                    None => "accounts:none".to_string(),
                };
                accounts.lock().unwrap().push(entry)
            })
            .on_account_selected(move |a| {
                account
                    .lock()
                    .unwrap()
                    .push(format!("account:{}", a.address))
            })
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Events starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

pub struct Harness {
    pub controller: ConnectionController,
    pub subscriber: ScriptedSubscriber,
    pub storage: Arc<MemoryStorage>,
    pub recorder: Recorder,
    pub events: EventBus,
}

/// Controller over X (installed) and Y (not installed)
pub fn harness(show_accounts_list: bool) -> Harness {
    harness_with(
        vec![wallet_x(), wallet_y()],
        show_accounts_list,
        Arc::new(MemoryStorage::new()),
    )
}

/// Controller over X and Y whose storage always fails
pub fn broken_storage_controller() -> (ConnectionController, ScriptedSubscriber, Recorder) {
    let subscriber = ScriptedSubscriber::default();
    let recorder = Recorder::default();

    let controller = ConnectionController::new(
        ConnectConfig {
            show_accounts_list: true,
        },
        Arc::new(StaticProvider {
            wallets: vec![wallet_x(), wallet_y()],
        }),
        Arc::new(subscriber.clone()),
        Arc::new(BrokenStorage),
    )
    .with_callbacks(recorder.callbacks());

    (controller, subscriber, recorder)
}

pub fn harness_with(
    wallets: Vec<Wallet>,
    show_accounts_list: bool,
    storage: Arc<MemoryStorage>,
) -> Harness {
    let subscriber = ScriptedSubscriber::default();
    let recorder = Recorder::default();
    let events = EventBus::new(8);

    let logged = LoggedStorage {
        inner: storage.clone(),
        log: subscriber.log.clone(),
    };

    let controller = ConnectionController::new(
        ConnectConfig { show_accounts_list },
        Arc::new(StaticProvider { wallets }),
        Arc::new(subscriber.clone()),
        Arc::new(logged),
    )
    .with_events(events.clone())
    .with_callbacks(recorder.callbacks());

    Harness {
        controller,
        subscriber,
        storage,
        recorder,
        events,
    }
}
