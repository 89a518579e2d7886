//! wallet-select - connect a browser-extension wallet from the terminal
//!
//! Wallets and the accounts they report are read from a wallets.json
//! registry; the last selected wallet is remembered between runs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use wallet_select::cli::commands;
use wallet_select::config::Config;

/// Browser-extension wallet selection
#[derive(Parser)]
#[command(name = "wallet-select")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "wallet-select.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the connection flow: pick a wallet, then an account
    Connect {
        /// Close as soon as an installed wallet is picked
        #[arg(long)]
        no_accounts: bool,
    },

    /// List wallets in the registry
    Wallets,

    /// Show the remembered wallet
    Last,

    /// Forget the remembered wallet
    Forget {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wallet_select=info".parse()?),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Connect { no_accounts } => commands::connect(&config, no_accounts).await,
        Commands::Wallets => commands::wallets(&config),
        Commands::Last => commands::last(&config),
        Commands::Forget { force } => commands::forget(&config, force),
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
