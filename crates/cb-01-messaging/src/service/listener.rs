//! Receiving side.
//!
//! ## Dispatch Rules
//!
//! 1. Envelopes whose `to` is neither the own tag nor `ALL` are ignored without
//!    side effects.
//! 2. Envelopes without a handler are logged and ignored; no reply is sent.
//! 3. Handlers start in arrival order on the listener's worker task and then
//!    run concurrently, so one slow handler never holds back the next one.
//!    Errors and panics are caught, logged and forwarded to the error sink; the
//!    channel acknowledgement does not depend on them.

use super::handlers::HandlerMap;
use crate::domain::{HandlerError, ListenerConfig, Protocol};
use crate::ports::{ErrorSink, HandlerFailure, RuntimeChannel};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use shared_bus::{Acknowledgement, EnvelopeListener, ReplySender, Subscription};
use shared_types::{Endpoint, Envelope, SenderInfo};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Lifecycle of a [`MessageListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Constructed or unlistened; holds no subscription.
    Unattached,
    /// Holds exactly one subscription.
    Listening,
}

/// One guarded handler invocation.
type Job = BoxFuture<'static, ()>;

struct Dispatcher<P: Protocol> {
    endpoint: Endpoint,
    handlers: HandlerMap<P>,
    sink: RwLock<Option<Arc<dyn ErrorSink>>>,
    /// Feeds the worker started by `listen`; `None` while unattached.
    jobs: RwLock<Option<mpsc::UnboundedSender<Job>>>,
}

/// Polls jobs in the order they were queued, then keeps them running side by
/// side. Exits once the queue is closed and every job has finished.
async fn run_jobs(mut queue: mpsc::UnboundedReceiver<Job>) {
    let mut running = FuturesUnordered::new();
    loop {
        tokio::select! {
            biased;
            job = queue.recv() => match job {
                Some(job) => running.push(job),
                None => break,
            },
            Some(()) = running.next(), if !running.is_empty() => {}
        }
    }
    while running.next().await.is_some() {}
}

impl<P: Protocol> EnvelopeListener for Dispatcher<P> {
    fn on_envelope(
        &self,
        envelope: Envelope,
        sender: SenderInfo,
        reply: ReplySender,
    ) -> Acknowledgement {
        if !envelope.is_for(self.endpoint) {
            trace!(operation = %envelope.name, to = %envelope.to, endpoint = ?self.endpoint, "Envelope not for this context");
            return Acknowledgement::Ignored;
        }

        let Some(handler) = self.handlers.get(&envelope.name) else {
            warn!(
                protocol = P::NAME,
                operation = %envelope.name,
                endpoint = ?self.endpoint,
                from = %envelope.from,
                "No handler for operation"
            );
            return Acknowledgement::Ignored;
        };

        debug!(operation = %envelope.name, endpoint = ?self.endpoint, from = %envelope.from, "Dispatching");

        let endpoint = self.endpoint;
        let sink = self.sink.read().clone();
        let Envelope { name, data, .. } = envelope;
        let reported_sender = sender.clone();

        let job: Job = async move {
            let outcome = AssertUnwindSafe(async move { handler.call(data, sender, reply).await })
                .catch_unwind()
                .await;

            let error = match outcome {
                Ok(Ok(())) => return,
                Ok(Err(error)) => error,
                Err(panic) => HandlerError::Panicked(panic_message(panic.as_ref())),
            };

            error!(
                operation = %name,
                endpoint = ?endpoint,
                sender = ?reported_sender,
                error = %error,
                "Handler failed"
            );

            if let Some(sink) = sink {
                sink.report(&HandlerFailure {
                    operation: name,
                    endpoint,
                    sender: reported_sender,
                    error,
                });
            }
        }
        .boxed();

        let queued = self
            .jobs
            .read()
            .as_ref()
            .map_or(false, |queue| queue.send(job).is_ok());
        if queued {
            Acknowledgement::Accepted
        } else {
            debug!(endpoint = ?self.endpoint, "Listener detached, envelope dropped");
            Acknowledgement::Ignored
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Routes envelopes addressed to this context to its handlers.
///
/// Constructed `Unattached`; dropping it unsubscribes.
pub struct MessageListener<P: Protocol> {
    channel: Arc<dyn RuntimeChannel>,
    dispatcher: Arc<Dispatcher<P>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<P: Protocol> MessageListener<P> {
    pub fn new(
        channel: Arc<dyn RuntimeChannel>,
        config: ListenerConfig,
        handlers: HandlerMap<P>,
    ) -> Self {
        let missing = handlers.missing();
        if !missing.is_empty() {
            debug!(protocol = P::NAME, ?missing, "Operations without a handler in this context");
        }

        Self {
            channel,
            dispatcher: Arc::new(Dispatcher {
                endpoint: config.endpoint(),
                handlers,
                sink: RwLock::new(None),
                jobs: RwLock::new(None),
            }),
            subscription: Mutex::new(None),
        }
    }

    /// Forward handler failures to `sink`.
    #[must_use]
    pub fn with_error_sink(self, sink: impl ErrorSink) -> Self {
        *self.dispatcher.sink.write() = Some(Arc::new(sink));
        self
    }

    /// Start receiving. Calling it while listening does nothing.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime; handlers run on a spawned
    /// worker task.
    pub fn listen(&self) {
        let mut slot = self.subscription.lock();
        if slot.is_some() {
            debug!(listener = %self, "Already listening");
            return;
        }
        let (jobs, queue) = mpsc::unbounded_channel();
        tokio::spawn(run_jobs(queue));
        *self.dispatcher.jobs.write() = Some(jobs);
        *slot = Some(self.channel.on_receive(self.dispatcher.clone()));
        info!(listener = %self, from = %self.endpoint().counterpart(), "Listening for messages");
    }

    /// Stop receiving. Calling it while unattached does nothing.
    pub fn unlisten(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.unsubscribe();
            // Handlers already started run to completion.
            self.dispatcher.jobs.write().take();
            info!(listener = %self, "No longer listening for messages");
        }
    }

    pub fn state(&self) -> ListenerState {
        if self.subscription.lock().is_some() {
            ListenerState::Listening
        } else {
            ListenerState::Unattached
        }
    }

    /// The listener's own tag.
    pub fn endpoint(&self) -> Endpoint {
        self.dispatcher.endpoint
    }
}

impl<P: Protocol> Drop for MessageListener<P> {
    fn drop(&mut self) {
        self.unlisten();
    }
}

impl<P: Protocol> fmt::Display for MessageListener<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageListener({})", self.dispatcher.endpoint)
    }
}
