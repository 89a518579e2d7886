//! Subscription identity and cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Identifies one opened account feed. Monotonic per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type CancelHook = Box<dyn FnOnce() + Send>;

/// Cancellation capability returned when a feed is opened
///
/// `cancel()` is idempotent: the token is cancelled and the hook runs
/// on the first call only.
pub struct CancelHandle {
    token: CancellationToken,
    cancelled: AtomicBool,
    hook: Mutex<Option<CancelHook>>,
}

impl CancelHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            cancelled: AtomicBool::new(false),
            hook: Mutex::new(None),
        }
    }

    /// Run `hook` once when the handle is first cancelled
    pub fn with_hook(token: CancellationToken, hook: impl FnOnce() + Send + 'static) -> Self {
        Self {
            token,
            cancelled: AtomicBool::new(false),
            hook: Mutex::new(Some(Box::new(hook))),
        }
    }

    /// Cancel the feed. Returns true if this call performed the cancellation.
    pub fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }

        self.token.cancel();

        let hook = self.hook.lock().ok().and_then(|mut guard| guard.take());
        if let Some(hook) = hook {
            hook();
        }

        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Token a feed task can wait on
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
