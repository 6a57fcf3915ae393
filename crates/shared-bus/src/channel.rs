//! # Runtime Channel
//!
//! Defines the broadcast primitive contract consumed by the messaging layer.

use crate::subscriber::Subscription;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use shared_types::{DeliveryError, Envelope, SenderInfo, TargetId, TargetInfo};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Trait for sending envelopes between contexts.
///
/// Every send resolves with exactly one reply or a `DeliveryError`. There is
/// no timeout: a send whose receivers keep the reply handle alive without
/// answering stays pending.
#[async_trait]
pub trait RuntimeChannel: Send + Sync {
    /// Broadcast an envelope to every context reachable by broadcast.
    ///
    /// # Returns
    ///
    /// The first reply produced by any receiver.
    async fn send(&self, envelope: Envelope) -> Result<Value, DeliveryError>;

    /// Send an envelope directly to one target-hosted instance.
    async fn send_to(&self, target: TargetId, envelope: Envelope) -> Result<Value, DeliveryError>;

    /// Register a listener for envelopes routed to this context.
    ///
    /// Dropping the returned `Subscription` unregisters the listener.
    fn on_receive(&self, listener: Arc<dyn EnvelopeListener>) -> Subscription;

    /// Enumerate the currently open target-hosted instances.
    async fn list_targets(&self) -> Result<Vec<TargetInfo>, DeliveryError>;
}

/// Channel-level acknowledgement returned by a listener for one envelope.
///
/// Independent of whether a handler later succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// The envelope was accepted; a reply may follow asynchronously.
    Accepted,
    /// The envelope was not for this listener.
    Ignored,
}

/// Receives envelopes delivered to a subscription.
pub trait EnvelopeListener: Send + Sync + 'static {
    /// Called once per delivered envelope, in send order per sender.
    fn on_envelope(
        &self,
        envelope: Envelope,
        sender: SenderInfo,
        reply: ReplySender,
    ) -> Acknowledgement;
}

impl<F> EnvelopeListener for F
where
    F: Fn(Envelope, SenderInfo, ReplySender) -> Acknowledgement + Send + Sync + 'static,
{
    fn on_envelope(
        &self,
        envelope: Envelope,
        sender: SenderInfo,
        reply: ReplySender,
    ) -> Acknowledgement {
        self(envelope, sender, reply)
    }
}

/// One-shot reply slot shared by every receiver of a single send.
///
/// The first `send` wins. When every clone is dropped without a reply the
/// caller observes `DeliveryError::PortClosed`.
#[derive(Clone)]
pub struct ReplySender {
    slot: Arc<Mutex<Option<oneshot::Sender<Value>>>>,
}

impl ReplySender {
    /// Create a reply slot and the receiver the caller awaits.
    pub fn channel() -> (Self, oneshot::Receiver<Value>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Deliver the reply.
    ///
    /// # Returns
    ///
    /// `true` if this was the first reply and the caller is still waiting.
    pub fn send(&self, reply: Value) -> bool {
        match self.slot.lock().take() {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    /// Returns true once a reply has been sent.
    pub fn is_answered(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl std::fmt::Debug for ReplySender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplySender")
            .field("answered", &self.is_answered())
            .finish()
    }
}
