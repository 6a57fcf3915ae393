//! # Inbound Ports (Driving Ports)
//!
//! The handler contract. A handler is bound to exactly one operation.

use crate::domain::{HandlerError, Operation};
use futures::future::BoxFuture;
use shared_bus::ReplySender;
use shared_types::{to_wire, SenderInfo};
use std::future::Future;
use std::marker::PhantomData;

/// Everything a handler receives for one call.
pub struct HandlerContext<O: Operation> {
    /// Decoded request payload.
    pub data: O::Input,
    /// Sender as observed by the channel.
    pub sender: SenderInfo,
    /// Reply slot. May be answered later from another task.
    pub reply: Reply<O>,
}

impl<O: Operation> HandlerContext<O> {
    /// Reply with `output` and finish.
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::InvalidReply` if `output` cannot be encoded.
    pub fn respond(self, output: O::Output) -> Result<(), HandlerError> {
        self.reply.send(&output).map(|_| ())
    }
}

/// Typed reply slot of one call.
///
/// Dropping it without sending releases the caller with `PortClosed` unless
/// another receiver answers.
pub struct Reply<O: Operation> {
    inner: ReplySender,
    _op: PhantomData<fn() -> O>,
}

impl<O: Operation> Reply<O> {
    pub(crate) fn new(inner: ReplySender) -> Self {
        Self {
            inner,
            _op: PhantomData,
        }
    }

    /// Send the reply.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if this was the first reply and the caller is still waiting.
    pub fn send(&self, output: &O::Output) -> Result<bool, HandlerError> {
        let value = to_wire(output).map_err(HandlerError::InvalidReply)?;
        Ok(self.inner.send(value))
    }

    /// Returns true once any receiver has answered this call.
    pub fn is_answered(&self) -> bool {
        self.inner.is_answered()
    }
}

impl<O: Operation> std::fmt::Debug for Reply<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply")
            .field("operation", &O::NAME)
            .field("answered", &self.is_answered())
            .finish()
    }
}

/// Handles calls to operation `O`.
///
/// Implemented for every `Fn(HandlerContext<O>) -> impl Future<Output = Result<(), HandlerError>>`.
pub trait Handler<O: Operation>: Send + Sync + 'static {
    fn handle(&self, ctx: HandlerContext<O>) -> BoxFuture<'static, Result<(), HandlerError>>;
}

impl<O, F, Fut> Handler<O> for F
where
    O: Operation,
    F: Fn(HandlerContext<O>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn handle(&self, ctx: HandlerContext<O>) -> BoxFuture<'static, Result<(), HandlerError>> {
        Box::pin(self(ctx))
    }
}
