//! Wallet selection library
//!
//! Connection flow for browser-extension wallets: discover wallets, pick
//! one, subscribe to its accounts and pick an account. Only the most
//! recently selected wallet's feed can ever update the flow.

pub mod cli;
pub mod config;
pub mod connect;
pub mod error;
pub mod events;
pub mod storage;
pub mod subscription;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use connect::{ConnectionController, FlowState, FlowView, HostCallbacks};
pub use error::{Error, Result};
pub use events::{EventBus, WalletSelected};
pub use storage::PersistenceAdapter;
pub use subscription::{AccountSubscriber, CancelHandle};
pub use wallet::{Wallet, WalletAccount, WalletProvider};
