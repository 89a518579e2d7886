//! Wallet connection flow
//!
//! # Architecture
//!
//! ```text
//! PresentationLayer ──intents──▶ ConnectionController ──▶ HostCallbacks
//!                                  │        │      │
//!                      WalletProvider  Persistence  EventBus
//!                                  │
//!                        AccountSubscriber ──FeedMessage──▶ (back to controller)
//! ```
//!
//! # States
//!
//! | State | Entered by |
//! |-------|------------|
//! | `Closed` | initial, `close()`, account picked, teardown |
//! | `WalletList` | `open()`, `back()` |
//! | `Connecting` | `select_wallet()` |
//! | `NeedsExtension` | feed settles for a missing extension |
//! | `NoAccounts` | feed settles with none of the wallet's accounts |
//! | `AccountsReady` | feed settles with the wallet's accounts |

pub mod callbacks;
pub mod controller;
pub mod state;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use callbacks::HostCallbacks;
pub use controller::ConnectionController;
pub use state::FlowState;
pub use view::{FlowView, ViewBody};
