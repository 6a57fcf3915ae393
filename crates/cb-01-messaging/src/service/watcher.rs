//! Reply-less observers.

use crate::domain::{ListenerConfig, Operation};
use crate::ports::RuntimeChannel;
use shared_bus::{Acknowledgement, EnvelopeListener, ReplySender, Subscription};
use shared_types::{from_wire, Endpoint, Envelope, SenderInfo};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

struct Watch<O, F> {
    endpoint: Endpoint,
    callback: F,
    _op: PhantomData<fn() -> O>,
}

impl<O, F> EnvelopeListener for Watch<O, F>
where
    O: Operation,
    F: Fn(O::Input) + Send + Sync + 'static,
{
    fn on_envelope(
        &self,
        envelope: Envelope,
        _sender: SenderInfo,
        _reply: ReplySender,
    ) -> Acknowledgement {
        if envelope.name != O::NAME || !envelope.is_for(self.endpoint) {
            return Acknowledgement::Ignored;
        }
        match from_wire::<O::Input>(envelope.data) {
            Ok(data) => {
                (self.callback)(data);
                Acknowledgement::Accepted
            }
            Err(e) => {
                warn!(operation = O::NAME, error = %e, "Watched message has an unexpected shape");
                Acknowledgement::Ignored
            }
        }
    }
}

/// Observes calls to one operation in the current context without replying.
///
/// Runs alongside the context's listener. Dropping the watcher unsubscribes.
#[derive(Debug)]
pub struct MessageWatcher {
    operation: &'static str,
    subscription: Subscription,
}

impl MessageWatcher {
    /// Invoke `callback` with the input of every `O` call routed to this context.
    pub fn watch<O, F>(channel: &dyn RuntimeChannel, config: ListenerConfig, callback: F) -> Self
    where
        O: Operation,
        F: Fn(O::Input) + Send + Sync + 'static,
    {
        let watch = Watch::<O, F> {
            endpoint: config.endpoint(),
            callback,
            _op: PhantomData,
        };
        Self {
            operation: O::NAME,
            subscription: channel.on_receive(Arc::new(watch)),
        }
    }

    /// The watched operation.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Stop observing now instead of on drop.
    pub fn stop(self) {
        self.subscription.unsubscribe();
    }
}
