//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the messaging service.
//!
//! Production: a host-specific `RuntimeChannel` over the platform messaging API.
//! Testing: `shared_bus::InMemoryRuntime` ports.

use crate::domain::HandlerError;
use shared_types::{Endpoint, SenderInfo};

pub use shared_bus::RuntimeChannel;

/// A handler failure as reported to an [`ErrorSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Operation whose handler failed.
    pub operation: String,
    /// Tag of the context the handler runs in.
    pub endpoint: Endpoint,
    /// Who sent the failing call.
    pub sender: SenderInfo,
    /// What went wrong.
    pub error: HandlerError,
}

/// Receives handler failures (crash reporting, metrics, tests).
pub trait ErrorSink: Send + Sync + 'static {
    fn report(&self, failure: &HandlerFailure);
}

impl<F> ErrorSink for F
where
    F: Fn(&HandlerFailure) + Send + Sync + 'static,
{
    fn report(&self, failure: &HandlerFailure) {
        self(failure)
    }
}
