//! # In-Memory Runtime
//!
//! In-process implementation of the runtime channel.
//!
//! Suitable for a single process hosting several logical contexts (and for
//! tests); a browser host would implement `RuntimeChannel` over its own
//! messaging API instead.

use crate::channel::{Acknowledgement, EnvelopeListener, ReplySender, RuntimeChannel};
use crate::subscriber::Subscription;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::{DeliveryError, Endpoint, Envelope, SenderInfo, TargetId, TargetInfo};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// What kind of context a port belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// The coordinator. Receives broadcasts.
    Coordinator,
    /// A foreground page that is not enumerable (popup, options page).
    /// Receives broadcasts.
    Page,
    /// A foreground instance hosted in an enumerable target.
    /// Receives only direct sends.
    Target(TargetId),
}

impl ContextKind {
    /// The endpoint tag a context of this kind sends as.
    pub fn endpoint(self) -> Endpoint {
        match self {
            ContextKind::Coordinator => Endpoint::Background,
            ContextKind::Page | ContextKind::Target(_) => Endpoint::View,
        }
    }

    fn receives_broadcast(self) -> bool {
        !matches!(self, ContextKind::Target(_))
    }
}

/// Delivery counters.
#[derive(Debug, Default)]
pub struct RuntimeStats {
    /// Total broadcast sends.
    pub broadcasts: AtomicU64,
    /// Total direct sends.
    pub direct_sends: AtomicU64,
    /// Total envelopes handed to subscriptions.
    pub deliveries: AtomicU64,
}

impl RuntimeStats {
    /// Broadcast sends so far.
    pub fn broadcasts(&self) -> u64 {
        self.broadcasts.load(Ordering::Relaxed)
    }

    /// Direct sends so far.
    pub fn direct_sends(&self) -> u64 {
        self.direct_sends.load(Ordering::Relaxed)
    }

    /// Deliveries so far.
    pub fn deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::Relaxed)
    }
}

/// A single envelope queued for one subscription.
struct Delivery {
    envelope: Envelope,
    sender: SenderInfo,
    reply: ReplySender,
}

struct ContextEntry {
    kind: ContextKind,
    url: Option<String>,
}

struct SubscriptionEntry {
    context: Uuid,
    queue: mpsc::UnboundedSender<Delivery>,
}

#[derive(Default)]
struct RuntimeInner {
    contexts: RwLock<HashMap<Uuid, ContextEntry>>,
    subscriptions: RwLock<HashMap<u64, SubscriptionEntry>>,
    next_subscription: AtomicU64,
    stats: RuntimeStats,
}

impl RuntimeInner {
    fn sender_info(&self, context: Uuid) -> Result<SenderInfo, DeliveryError> {
        let contexts = self.contexts.read();
        let entry = contexts.get(&context).ok_or(DeliveryError::Disconnected)?;
        let target_id = match entry.kind {
            ContextKind::Target(id) => Some(id),
            _ => None,
        };
        Ok(SenderInfo {
            endpoint: entry.kind.endpoint(),
            target_id,
            url: entry.url.clone(),
        })
    }

    /// Queue `envelope` for every subscription whose context passes `accept`,
    /// then wait for the first reply.
    async fn deliver(
        &self,
        from: Uuid,
        envelope: Envelope,
        accept: impl Fn(ContextKind) -> bool,
    ) -> Result<Value, DeliveryError> {
        let sender = self.sender_info(from)?;
        let (reply, rx) = ReplySender::channel();

        let delivered = {
            let contexts = self.contexts.read();
            let subscriptions = self.subscriptions.read();
            let mut delivered = 0usize;

            for entry in subscriptions.values() {
                if entry.context == from {
                    continue;
                }
                let Some(context) = contexts.get(&entry.context) else {
                    continue;
                };
                if !accept(context.kind) {
                    continue;
                }

                let delivery = Delivery {
                    envelope: envelope.clone(),
                    sender: sender.clone(),
                    reply: reply.clone(),
                };
                if entry.queue.send(delivery).is_ok() {
                    delivered += 1;
                }
            }
            delivered
        };

        // Only receivers may hold the reply slot from here on.
        drop(reply);

        if delivered == 0 {
            debug!(operation = %envelope.name, to = %envelope.to, "No receiving end for envelope");
            return Err(DeliveryError::NoReceiver);
        }

        self.stats
            .deliveries
            .fetch_add(delivered as u64, Ordering::Relaxed);
        trace!(operation = %envelope.name, receivers = delivered, "Envelope delivered");

        rx.await.map_err(|_| DeliveryError::PortClosed)
    }
}

/// In-memory implementation of the runtime channel hub.
///
/// Contexts connect to obtain a [`ContextPort`]. Clones share the same hub.
#[derive(Clone, Default)]
pub struct InMemoryRuntime {
    inner: Arc<RuntimeInner>,
}

impl InMemoryRuntime {
    /// Create an empty runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a new context.
    pub fn connect(&self, kind: ContextKind) -> ContextPort {
        self.connect_with_url(kind, None)
    }

    /// Connect a new context that has a URL.
    pub fn connect_with_url(&self, kind: ContextKind, url: Option<&str>) -> ContextPort {
        let id = Uuid::new_v4();
        self.inner.contexts.write().insert(
            id,
            ContextEntry {
                kind,
                url: url.map(str::to_string),
            },
        );
        debug!(context = %id, kind = ?kind, "Context connected");

        ContextPort {
            runtime: self.inner.clone(),
            id,
            kind,
        }
    }

    /// Connect the coordinator.
    pub fn coordinator(&self) -> ContextPort {
        self.connect(ContextKind::Coordinator)
    }

    /// Connect a non-enumerable foreground page.
    pub fn page(&self) -> ContextPort {
        self.connect(ContextKind::Page)
    }

    /// Connect a foreground instance hosted in target `id` at `url`.
    pub fn target(&self, id: TargetId, url: &str) -> ContextPort {
        self.connect_with_url(ContextKind::Target(id), Some(url))
    }

    /// Number of connected contexts.
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.inner.contexts.read().len()
    }

    /// Number of live subscriptions across all contexts.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriptions.read().len()
    }

    /// Delivery counters.
    #[must_use]
    pub fn stats(&self) -> &RuntimeStats {
        &self.inner.stats
    }
}

/// One context's connection to the runtime.
///
/// Dropping the port disconnects the context and all its subscriptions.
pub struct ContextPort {
    runtime: Arc<RuntimeInner>,
    id: Uuid,
    kind: ContextKind,
}

impl ContextPort {
    /// The context kind this port was connected as.
    #[must_use]
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    /// The endpoint tag this context sends as.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        self.kind.endpoint()
    }

    /// Change (or clear) the URL of this context.
    pub fn set_url(&self, url: Option<&str>) {
        if let Some(entry) = self.runtime.contexts.write().get_mut(&self.id) {
            entry.url = url.map(str::to_string);
        }
    }

    /// Disconnect now; later sends fail with `DeliveryError::Disconnected`.
    pub fn disconnect(&self) {
        self.runtime.contexts.write().remove(&self.id);
        self.runtime
            .subscriptions
            .write()
            .retain(|_, entry| entry.context != self.id);
        debug!(context = %self.id, "Context disconnected");
    }
}

impl Drop for ContextPort {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[async_trait]
impl RuntimeChannel for ContextPort {
    async fn send(&self, envelope: Envelope) -> Result<Value, DeliveryError> {
        self.runtime.stats.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.runtime
            .deliver(self.id, envelope, ContextKind::receives_broadcast)
            .await
    }

    async fn send_to(&self, target: TargetId, envelope: Envelope) -> Result<Value, DeliveryError> {
        self.runtime.stats.direct_sends.fetch_add(1, Ordering::Relaxed);

        let open = self
            .runtime
            .contexts
            .read()
            .values()
            .any(|c| c.kind == ContextKind::Target(target));
        if !open {
            warn!(target, operation = %envelope.name, "Direct send to unknown target");
            return Err(DeliveryError::UnknownTarget(target));
        }

        self.runtime
            .deliver(self.id, envelope, |kind| kind == ContextKind::Target(target))
            .await
    }

    /// Envelopes are handed to `listener` one at a time, in queue order.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime; each subscription is drained
    /// by a spawned task.
    fn on_receive(&self, listener: Arc<dyn EnvelopeListener>) -> Subscription {
        let id = self.runtime.next_subscription.fetch_add(1, Ordering::Relaxed);
        let (queue, mut rx) = mpsc::unbounded_channel::<Delivery>();

        self.runtime.subscriptions.write().insert(
            id,
            SubscriptionEntry {
                context: self.id,
                queue,
            },
        );

        tokio::spawn(async move {
            while let Some(delivery) = rx.recv().await {
                let operation = delivery.envelope.name.clone();
                let ack = listener.on_envelope(delivery.envelope, delivery.sender, delivery.reply);
                if ack == Acknowledgement::Ignored {
                    trace!(subscription = id, operation = %operation, "Envelope ignored");
                }
            }
        });

        let runtime: Weak<RuntimeInner> = Arc::downgrade(&self.runtime);
        Subscription::new(id, move || {
            if let Some(runtime) = runtime.upgrade() {
                runtime.subscriptions.write().remove(&id);
            }
        })
    }

    async fn list_targets(&self) -> Result<Vec<TargetInfo>, DeliveryError> {
        let contexts = self.runtime.contexts.read();
        if !contexts.contains_key(&self.id) {
            return Err(DeliveryError::Disconnected);
        }

        let mut targets: Vec<TargetInfo> = contexts
            .values()
            .filter_map(|c| match c.kind {
                ContextKind::Target(id) => Some(TargetInfo {
                    id,
                    has_url: c.url.is_some(),
                }),
                _ => None,
            })
            .collect();
        targets.sort_by_key(|t| t.id);
        targets.dedup_by_key(|t| t.id);
        Ok(targets)
    }
}
