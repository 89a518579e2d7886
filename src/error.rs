//! Error types for the wallet selection flow

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wallet selection
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Wallet discovery errors
    #[error("Wallet registry error: {0}")]
    Registry(String),

    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("No wallets available")]
    NoWallets,

    // Account feed errors
    #[error("Account subscription failed for {wallet}: {reason}")]
    Subscription { wallet: String, reason: String },

    // Persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Flow contract errors
    #[error("Connection flow is closed")]
    FlowClosed,

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error means the caller drove the flow out of order
    ///
    /// A correct presentation layer never triggers these.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::FlowClosed | Error::InvalidSelection(_) | Error::InvalidTransition(_)
        )
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
