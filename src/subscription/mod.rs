//! Account subscriptions
//!
//! A wallet's accounts arrive through a live feed opened per selection.
//! At most one feed is current per flow; the rest are cancelled garbage.

pub mod feed;
pub mod handle;

pub use feed::{AccountSink, AccountSubscriber, FeedEvent, FeedMessage};
pub use handle::{CancelHandle, SubscriptionId};
