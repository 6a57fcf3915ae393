//! # Subscription Handle
//!
//! Defines the receiving side of the runtime channel.

use std::fmt;
use tracing::debug;

/// A subscription handle for receiving envelopes.
///
/// When dropped, the subscription is automatically cleaned up.
pub struct Subscription {
    /// Identifier, unique within the channel that issued it.
    id: u64,

    /// Cleanup hook run exactly once (on `unsubscribe` or drop).
    cleanup: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Create a new subscription with a cleanup hook.
    pub fn new(id: u64, cleanup: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// A subscription that was never attached (the channel is gone).
    pub fn detached(id: u64) -> Self {
        Self { id, cleanup: None }
    }

    /// Get the subscription identifier.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns true while the cleanup hook has not run.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cleanup.is_some()
    }

    /// Unregister now instead of waiting for drop.
    pub fn unsubscribe(mut self) {
        self.run_cleanup();
    }

    fn run_cleanup(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
            debug!(subscription = self.id, "Subscription dropped");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cleanup();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
