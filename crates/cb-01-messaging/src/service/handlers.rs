//! Handler table of one context.

use crate::domain::{HandlerError, Operation, Protocol};
use crate::ports::{Handler, HandlerContext, Reply};
use futures::future::BoxFuture;
use serde_json::Value;
use shared_bus::ReplySender;
use shared_types::{from_wire, SenderInfo};
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// Type-erased handler, keyed by operation name.
pub(crate) trait ErasedHandler: Send + Sync {
    fn call(
        &self,
        data: Value,
        sender: SenderInfo,
        reply: ReplySender,
    ) -> BoxFuture<'static, Result<(), HandlerError>>;
}

struct TypedHandler<O, H> {
    handler: H,
    _op: PhantomData<fn() -> O>,
}

impl<O, H> ErasedHandler for TypedHandler<O, H>
where
    O: Operation,
    H: Handler<O>,
{
    fn call(
        &self,
        data: Value,
        sender: SenderInfo,
        reply: ReplySender,
    ) -> BoxFuture<'static, Result<(), HandlerError>> {
        match from_wire::<O::Input>(data) {
            Ok(data) => self.handler.handle(HandlerContext {
                data,
                sender,
                reply: Reply::new(reply),
            }),
            Err(e) => Box::pin(async move { Err(HandlerError::InvalidInput(e)) }),
        }
    }
}

/// At most one handler per operation of protocol `P`.
pub struct HandlerMap<P: Protocol> {
    handlers: HashMap<&'static str, Arc<dyn ErasedHandler>>,
    _protocol: PhantomData<fn() -> P>,
}

impl<P: Protocol> Default for HandlerMap<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Protocol> HandlerMap<P> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            _protocol: PhantomData,
        }
    }

    /// Register a closure handler for `O` (builder form).
    ///
    /// ```rust,ignore
    /// let handlers = HandlerMap::new().on::<OpenNewTab, _, _>(|ctx| async move {
    ///     ctx.respond(OpenTabResponse { tab_id: 7 })
    /// });
    /// ```
    #[must_use]
    pub fn on<O, F, Fut>(mut self, handler: F) -> Self
    where
        O: Operation<Protocol = P>,
        F: Fn(HandlerContext<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.insert::<O, F>(handler);
        self
    }

    /// Register a handler for `O`, replacing any previous one.
    ///
    /// # Returns
    ///
    /// `true` if a handler was replaced.
    pub fn insert<O, H>(&mut self, handler: H) -> bool
    where
        O: Operation<Protocol = P>,
        H: Handler<O>,
    {
        let typed = TypedHandler::<O, H> {
            handler,
            _op: PhantomData,
        };
        let replaced = self.handlers.insert(O::NAME, Arc::new(typed)).is_some();
        if replaced {
            warn!(
                protocol = P::NAME,
                operation = O::NAME,
                "Handler registered twice; previous handler replaced"
            );
        }
        replaced
    }

    /// Remove the handler for `O`.
    pub fn remove<O>(&mut self) -> bool
    where
        O: Operation<Protocol = P>,
    {
        self.handlers.remove(O::NAME).is_some()
    }

    /// Returns true if a handler exists for operation `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Operations of `P` with no handler in this map.
    pub fn missing(&self) -> Vec<&'static str> {
        P::OPERATIONS
            .iter()
            .copied()
            .filter(|name| !self.handlers.contains_key(name))
            .collect()
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<dyn ErasedHandler>> {
        self.handlers.get(name).cloned()
    }
}

impl<P: Protocol> std::fmt::Debug for HandlerMap<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerMap")
            .field("protocol", &P::NAME)
            .field("operations", &names)
            .finish()
    }
}
