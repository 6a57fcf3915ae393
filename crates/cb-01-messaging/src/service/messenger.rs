//! Sending side.
//!
//! Every send resolves with exactly one reply from the broadcast primitive;
//! concurrent calls to the same operation are independent sends, so no
//! correlation id is layered on top.

use crate::domain::{Destination, MessagingError, Operation, Protocol};
use crate::ports::RuntimeChannel;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use shared_types::{from_wire, to_wire, DeliveryError, Endpoint, Envelope, TargetId};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Typed sender for the operations of protocol `P`.
///
/// The generated call trait of `P` is implemented for `Messenger<P>`; the
/// generic [`call`](Self::call) is always available.
pub struct Messenger<P: Protocol> {
    channel: Arc<dyn RuntimeChannel>,
    from: Endpoint,
    destination: Destination,
    _protocol: PhantomData<fn() -> P>,
}

impl<P: Protocol> Clone for Messenger<P> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
            from: self.from,
            destination: self.destination,
            _protocol: PhantomData,
        }
    }
}

impl<P: Protocol> Messenger<P> {
    /// Messenger sending as `from` to `destination`.
    pub fn new(
        channel: Arc<dyn RuntimeChannel>,
        from: Endpoint,
        destination: impl Into<Destination>,
    ) -> Self {
        Self {
            channel,
            from,
            destination: destination.into(),
            _protocol: PhantomData,
        }
    }

    /// Foreground to coordinator.
    pub fn to_background(channel: Arc<dyn RuntimeChannel>) -> Self {
        Self::new(channel, Endpoint::View, Endpoint::Background)
    }

    /// Coordinator to foreground instances (broadcast).
    pub fn to_views(channel: Arc<dyn RuntimeChannel>) -> Self {
        Self::new(channel, Endpoint::Background, Endpoint::View)
    }

    /// Same channel and sender tag, different destination.
    #[must_use]
    pub fn with_destination(&self, destination: impl Into<Destination>) -> Self {
        Self {
            destination: destination.into(),
            ..self.clone()
        }
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// The tag written into `Envelope::from`.
    pub fn sender_tag(&self) -> Endpoint {
        self.from
    }

    /// Call `O` at the configured destination.
    ///
    /// With [`Destination::AllViews`] this resolves with the first reply in
    /// issue order once every send has succeeded, or with the first failure.
    pub async fn call<O>(&self, input: O::Input) -> Result<O::Output, MessagingError>
    where
        O: Operation<Protocol = P>,
    {
        match self.destination {
            Destination::Endpoint(to) => {
                let envelope = self.envelope::<O>(to, &input)?;
                let reply = self.channel.send(envelope).await?;
                decode::<O>(reply)
            }
            Destination::Target(target) => self.call_target::<O>(target, input).await,
            Destination::AllViews => self
                .call_all::<O>(input)
                .await?
                .into_iter()
                .next()
                .ok_or(MessagingError::Delivery(DeliveryError::NoReceiver)),
        }
    }

    /// Call `O` on one numbered target, bypassing the broadcast.
    pub async fn call_target<O>(
        &self,
        target: TargetId,
        input: O::Input,
    ) -> Result<O::Output, MessagingError>
    where
        O: Operation<Protocol = P>,
    {
        let envelope = self.envelope::<O>(Endpoint::View, &input)?;
        let reply = self.channel.send_to(target, envelope).await?;
        decode::<O>(reply)
    }

    /// Call `O` on every open foreground instance.
    ///
    /// Sends directly to each enumerable target that has a URL and emits one
    /// `VIEW` broadcast for instances that cannot be enumerated. Each send
    /// runs as its own task. Resolves with the replies in issue order
    /// (targets by id, then the broadcast) once every send has succeeded, or
    /// with the first failure as soon as it happens. Sends still in flight
    /// keep running after a failure.
    pub async fn call_all<O>(&self, input: O::Input) -> Result<Vec<O::Output>, MessagingError>
    where
        O: Operation<Protocol = P>,
    {
        let envelope = self.envelope::<O>(Endpoint::View, &input)?;
        let targets = self.channel.list_targets().await?;

        let mut sends: Vec<JoinHandle<Result<Value, DeliveryError>>> =
            Vec::with_capacity(targets.len() + 1);

        for target in targets.into_iter().filter(|t| t.has_url) {
            let channel = self.channel.clone();
            let envelope = envelope.clone();
            sends.push(tokio::spawn(async move {
                channel.send_to(target.id, envelope).await
            }));
        }
        let direct = sends.len();

        let channel = self.channel.clone();
        sends.push(tokio::spawn(async move { channel.send(envelope).await }));

        debug!(operation = O::NAME, direct, "Fan-out issued");

        let total = sends.len();
        let mut pending: FuturesUnordered<_> = sends
            .into_iter()
            .enumerate()
            .map(|(index, send)| async move { (index, send.await) })
            .collect();
        let mut outputs: Vec<Option<O::Output>> =
            std::iter::repeat_with(|| None).take(total).collect();

        // Dropping `pending` detaches the remaining tasks without aborting them.
        while let Some((index, joined)) = pending.next().await {
            let result = match joined {
                Ok(reply) => reply
                    .map_err(MessagingError::from)
                    .and_then(decode::<O>),
                Err(e) => Err(MessagingError::TaskAborted {
                    operation: O::NAME.to_string(),
                    reason: e.to_string(),
                }),
            };
            match result {
                Ok(output) => outputs[index] = Some(output),
                Err(error) => {
                    warn!(
                        operation = O::NAME,
                        send = index,
                        unfinished = pending.len(),
                        total,
                        error = %error,
                        "Fan-out rejected"
                    );
                    return Err(error);
                }
            }
        }

        Ok(outputs.into_iter().flatten().collect())
    }

    fn envelope<O>(&self, to: Endpoint, input: &O::Input) -> Result<Envelope, MessagingError>
    where
        O: Operation<Protocol = P>,
    {
        let data = to_wire(input)?;
        debug!(operation = O::NAME, from = %self.from, to = %to, "Sending");
        Ok(Envelope::new(O::NAME, data, self.from, to))
    }
}

fn decode<O: Operation>(reply: Value) -> Result<O::Output, MessagingError> {
    Ok(from_wire::<O::Output>(reply)?)
}

impl<P: Protocol> std::fmt::Debug for Messenger<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("protocol", &P::NAME)
            .field("from", &self.from)
            .field("destination", &self.destination)
            .finish()
    }
}
