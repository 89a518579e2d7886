//! CLI command implementations

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dialoguer::{Confirm, Select};
use tracing::{info, warn};

use crate::config::{Config, ConnectConfig};
use crate::connect::view::NO_WALLET_LINK;
use crate::connect::{ConnectionController, HostCallbacks, ViewBody};
use crate::events::EventBus;
use crate::storage::{self, PersistenceAdapter, SELECTED_WALLET_KEY};
use crate::wallet::{WalletAccount, WalletProvider, WalletRegistry};

use super::short_address;

/// Extra time allowed for a background feed after the flow auto-closes
const BACKGROUND_FEED_GRACE: Duration = Duration::from_secs(5);

fn load_registry(config: &Config) -> Result<Arc<WalletRegistry>> {
    let registry = WalletRegistry::load(
        Path::new(&config.registry.path),
        Duration::from_millis(config.registry.feed_delay_ms),
    )
    .with_context(|| format!("Failed to load wallet registry {}", config.registry.path))?;
    Ok(Arc::new(registry))
}

fn open_storage(config: &Config) -> Result<Arc<dyn PersistenceAdapter>> {
    storage::open(&config.storage)
        .with_context(|| format!("Failed to open {} storage", config.storage.backend))
}

fn host_callbacks() -> HostCallbacks {
    HostCallbacks::new()
        .on_open(|wallets| info!("Wallet list shown ({} wallets)", wallets.len()))
        .on_close(|| info!("Connection flow closed"))
        .on_wallet_selected(|wallet| info!("Host notified: wallet {} selected", wallet))
        .on_accounts_updated(|accounts| match accounts {
            Some(accounts) => info!("Host notified: {} accounts", accounts.len()),
            None => warn!("Host notified: account feed failed"),
        })
        .on_account_selected(|account| info!("Host notified: account {} selected", account.key()))
}

fn account_label(account: &WalletAccount) -> String {
    let address = short_address(&account.address);
    if account.name.is_empty() {
        address
    } else {
        format!("{} ({})", account.name, address)
    }
}

/// Run the interactive connection flow
pub async fn connect(config: &Config, no_accounts: bool) -> Result<()> {
    let registry = load_registry(config)?;
    let storage = open_storage(config)?;

    let events = EventBus::new(config.events.channel_capacity);
    let mut selections = events.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(event) = selections.recv().await {
            info!(
                flow = %event.flow_id,
                wallet = %event.wallet,
                at = %event.selected_at.to_rfc3339(),
                "Wallet selection event"
            );
        }
    });

    let connect_config = ConnectConfig {
        show_accounts_list: config.connect.show_accounts_list && !no_accounts,
    };

    let mut controller = ConnectionController::new(
        connect_config,
        registry.clone(),
        registry.clone(),
        storage,
    )
    .with_events(events)
    .with_callbacks(host_callbacks());

    if let Some(last) = controller.last_selected_wallet() {
        println!("Last used wallet: {}", last.title);
    }

    controller.open();
    let mut chosen: Option<WalletAccount> = None;

    loop {
        let view = controller.view();
        match view.body {
            ViewBody::Hidden => break,

            ViewBody::WalletList(wallets) => {
                let mut items: Vec<String> = wallets.iter().map(|w| w.list_label()).collect();
                let fallback = view.show_no_wallet_link && !wallets.is_empty();
                if fallback {
                    items.push(NO_WALLET_LINK.to_string());
                }
                items.push("Close".to_string());

                let pick = Select::new()
                    .with_prompt(&view.title)
                    .items(&items)
                    .default(0)
                    .interact()?;

                if pick < wallets.len() {
                    controller.select_wallet(wallets[pick].clone()).await?;
                } else if fallback && pick == wallets.len() {
                    controller.select_first_wallet().await?;
                } else {
                    controller.close();
                }
            }

            ViewBody::AccountSkeleton { .. } | ViewBody::Waiting => {
                println!("{}", view.title);
                controller.process_next().await;
            }

            ViewBody::InstallPrompt {
                message,
                install_url,
                label,
            } => {
                println!("\n=== {} ===", view.title);
                if !message.is_empty() {
                    println!("{}", message);
                }
                println!("{}: {}", label, install_url);

                if !back_or_close(&mut controller, &view.title)? {
                    break;
                }
            }

            ViewBody::NoAccounts { lines } => {
                println!("\n=== {} ===", view.title);
                for line in lines {
                    println!("{}", line);
                }

                if !back_or_close(&mut controller, &view.title)? {
                    break;
                }
            }

            ViewBody::Accounts(accounts) => {
                let mut items: Vec<String> = accounts.iter().map(account_label).collect();
                items.push("Back".to_string());
                items.push("Close".to_string());

                let pick = Select::new()
                    .with_prompt(&view.title)
                    .items(&items)
                    .default(0)
                    .interact()?;

                if pick < accounts.len() {
                    chosen = Some(controller.select_account(&accounts[pick])?);
                } else if pick == accounts.len() {
                    controller.back()?;
                } else {
                    controller.close();
                }
            }
        }
    }

    // Auto-closed flows keep listening for the selected wallet
    if controller.current_subscription().is_some() && chosen.is_none() {
        let wait =
            Duration::from_millis(config.registry.feed_delay_ms) + BACKGROUND_FEED_GRACE;
        if tokio::time::timeout(wait, controller.process_next()).await.is_err() {
            warn!("No account report within {:?}", wait);
        }
    }

    match &chosen {
        Some(account) => {
            println!("\n=== CONNECTED ===");
            println!("Wallet: {}", account.source);
            println!("Account: {}", account_label(account));
            println!("Address: {}", account.address);
        }
        None => match controller.last_selected_wallet() {
            Some(wallet) => println!("\nRemembered wallet: {}", wallet.title),
            None => println!("\nNo account selected"),
        },
    }

    controller.teardown();
    listener.abort();

    Ok(())
}

/// Offer Back/Close on a settled screen. Returns false once the flow closed.
fn back_or_close(controller: &mut ConnectionController, title: &str) -> Result<bool> {
    let pick = Select::new()
        .with_prompt(title)
        .items(&["Back", "Close"])
        .default(0)
        .interact()?;

    if pick == 0 {
        controller.back()?;
        Ok(true)
    } else {
        controller.close();
        Ok(false)
    }
}

/// List wallets known to the registry
pub fn wallets(config: &Config) -> Result<()> {
    let registry = load_registry(config)?;

    if registry.entries().is_empty() {
        println!("No wallets configured in {}", config.registry.path);
        return Ok(());
    }

    println!(
        "{:<20} {:<20} {:<10} {:<9} {}",
        "EXTENSION", "TITLE", "INSTALLED", "ACCOUNTS", "INSTALL URL"
    );
    println!("{}", "-".repeat(90));

    for entry in registry.entries() {
        let wallet = &entry.wallet;
        println!(
            "{:<20} {:<20} {:<10} {:<9} {}",
            wallet.extension_name,
            wallet.title,
            if wallet.installed { "yes" } else { "no" },
            entry.accounts.len(),
            wallet.install_url
        );
    }

    Ok(())
}

/// Show the remembered wallet
pub fn last(config: &Config) -> Result<()> {
    let registry = load_registry(config)?;
    let storage = open_storage(config)?;

    let stored = storage.get(SELECTED_WALLET_KEY)?;
    let controller = ConnectionController::new(
        ConnectConfig::default(),
        registry.clone(),
        registry.clone(),
        storage,
    );

    match (controller.last_selected_wallet(), stored) {
        (Some(wallet), _) => {
            println!("Last selected wallet: {} ({})", wallet.title, wallet.extension_name);
        }
        (None, Some(name)) if !registry.is_installed(Some(&name)) => {
            println!("Last selected wallet {} is no longer installed and was forgotten", name);
        }
        (None, _) => println!("No wallet remembered"),
    }

    controller.teardown();
    Ok(())
}

/// Forget the remembered wallet
pub fn forget(config: &Config, force: bool) -> Result<()> {
    let storage = open_storage(config)?;

    let name = match storage.get(SELECTED_WALLET_KEY)? {
        Some(name) => name,
        None => {
            println!("No wallet remembered");
            return Ok(());
        }
    };

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Forget last selected wallet {}?", name))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Forget cancelled by user");
            return Ok(());
        }
    }

    storage.remove(SELECTED_WALLET_KEY)?;
    info!("Forgot last selected wallet {}", name);
    println!("Forgot {}", name);

    Ok(())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.display());
    Ok(())
}
