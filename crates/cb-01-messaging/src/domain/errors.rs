//! Error types for the messaging layer.

use shared_types::{DeliveryError, SerializationError};
use thiserror::Error;

/// Errors surfaced to the caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagingError {
    /// The broadcast primitive rejected the send.
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// The input could not be encoded or the reply could not be decoded.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    /// A fan-out send task did not complete.
    #[error("Send task for '{operation}' aborted: {reason}")]
    TaskAborted { operation: String, reason: String },
}

/// Failure of a handler, caught at the listener boundary.
///
/// Never crosses to the caller; only explicit replies do.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("{0}")]
    Failed(String),

    /// The handler panicked.
    #[error("Handler panicked: {0}")]
    Panicked(String),

    /// The envelope payload did not match the operation's input shape.
    #[error("Invalid input: {0}")]
    InvalidInput(SerializationError),

    /// The reply value could not be encoded.
    #[error("Invalid reply: {0}")]
    InvalidReply(SerializationError),
}

impl HandlerError {
    /// Wrap any displayable failure.
    pub fn msg(message: impl std::fmt::Display) -> Self {
        HandlerError::Failed(message.to_string())
    }
}
