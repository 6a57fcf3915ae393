//! # Error Types
//!
//! Defines error types used across contexts.

use thiserror::Error;

/// Channel-level failures. Surfaced to the caller as a rejection, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// No subscription was able to receive the envelope.
    #[error("Could not establish connection: receiving end does not exist")]
    NoReceiver,

    /// Every receiver released its reply handle without replying.
    #[error("Message port closed before a response was received")]
    PortClosed,

    /// The addressed target is not open.
    #[error("No open target with id {0}")]
    UnknownTarget(u32),

    /// The sending port has been disconnected from the runtime.
    #[error("Sending context is disconnected")]
    Disconnected,
}

/// Errors at the serialization boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    /// The value could not be encoded into its wire form.
    #[error("Failed to encode value: {0}")]
    Encode(String),

    /// The wire form could not be decoded into the requested shape.
    #[error("Failed to decode value: {0}")]
    Decode(String),
}
