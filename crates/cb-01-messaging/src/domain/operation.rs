//! # Operation Definitions
//!
//! An operation maps a name to an input shape and an output shape. Both the
//! sending and the handling side are typed from the same definition, so the
//! name constant is the only thing that exists at runtime.
//!
//! Definitions are normally generated with [`define_protocol!`](crate::define_protocol).

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A named group of operations shared by every context of one application.
pub trait Protocol: Send + Sync + 'static {
    /// Protocol name, used in logs.
    const NAME: &'static str;

    /// Names of every operation in the protocol, in declaration order.
    const OPERATIONS: &'static [&'static str];
}

/// A single request/response operation.
///
/// Operations without input use `()` as `Input`.
pub trait Operation: Send + Sync + 'static {
    /// Wire name carried in `Envelope::name`.
    const NAME: &'static str;

    /// Request payload.
    type Input: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Reply payload.
    type Output: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// The protocol this operation belongs to.
    type Protocol: Protocol;
}
