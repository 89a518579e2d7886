//! Persistence of the last selected wallet
//!
//! The flow only remembers one thing across reloads: the extension name of
//! the wallet picked last. Backends implement [`PersistenceAdapter`].

pub mod file;
pub mod memory;

use std::path::Path;
use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Key under which the last selected wallet name is stored
pub const SELECTED_WALLET_KEY: &str = "wallet-select/selected-wallet-name";

/// Durable key/value store
///
/// Writes are synchronous so they are ordered before anything that follows.
pub trait PersistenceAdapter: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Open the configured backend
pub fn open(config: &StorageConfig) -> Result<Arc<dyn PersistenceAdapter>> {
    match config.backend {
        StorageBackend::File => Ok(Arc::new(FileStorage::open(Path::new(&config.path))?)),
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
    }
}
