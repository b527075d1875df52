//! Cooperative cancellation for in-flight tasks.
//!
//! A `CancelToken` is the only mutable state shared between a task and its
//! owner: the owner sets it, the task polls it at stage boundaries and
//! passes it into any call that can block for a long time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable cancellation flag.
///
/// Cloning produces a handle to the same underlying flag, so a caller can
/// keep one clone and hand another to the task it wants to be able to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any thread, any number of times.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
