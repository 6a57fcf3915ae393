//! # Message Envelope
//!
//! The wire unit for ALL cross-context messaging.
//!
//! ## Routing Properties
//!
//! - **Tag Addressing**: `from`/`to` are coarse endpoint tags, never concrete
//!   process handles.
//! - **Self-Filtering**: Every listener sees every envelope routed to its
//!   context and MUST ignore the ones whose `to` is not its own tag.
//! - **No Correlation ID**: The channel returns exactly one reply per send, so
//!   the envelope carries no request identifier.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Numeric identity of a directly addressable foreground instance.
pub type TargetId = u32;

/// The kind of context a message is sent from or routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Endpoint {
    /// The long-lived coordinator process.
    Background,
    /// A foreground instance (tab-hosted script or extension page).
    View,
    /// Destination-only tag matching every endpoint.
    ///
    /// A context's own tag is never `All`.
    All,
}

impl Endpoint {
    /// Returns true if an envelope addressed to `self` must be handled by a
    /// context whose own tag is `own`.
    #[must_use]
    pub fn accepts(self, own: Endpoint) -> bool {
        self == Endpoint::All || self == own
    }

    /// The endpoint a context with this tag usually talks to.
    #[must_use]
    pub fn counterpart(self) -> Endpoint {
        match self {
            Endpoint::Background => Endpoint::View,
            Endpoint::View => Endpoint::Background,
            Endpoint::All => Endpoint::All,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Endpoint::Background => "BACKGROUND",
            Endpoint::View => "VIEW",
            Endpoint::All => "ALL",
        };
        f.write_str(tag)
    }
}

/// The universal envelope for operation calls between contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Operation name, as declared in the protocol.
    pub name: String,
    /// Serialized operation input (`null` for operations without input).
    pub data: Value,
    /// Tag of the sending context.
    pub from: Endpoint,
    /// Tag of the intended receiving context.
    pub to: Endpoint,
}

impl Envelope {
    /// Build an envelope for `name` carrying an already-serialized payload.
    pub fn new(name: impl Into<String>, data: Value, from: Endpoint, to: Endpoint) -> Self {
        Self {
            name: name.into(),
            data,
            from,
            to,
        }
    }

    /// Returns true if a context with tag `own` must act on this envelope.
    #[must_use]
    pub fn is_for(&self, own: Endpoint) -> bool {
        self.to.accepts(own)
    }
}

/// Who sent an envelope, as observed by the channel.
///
/// Filled in by the channel on delivery. Handlers can trust it more than any
/// payload field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderInfo {
    /// Tag of the sending context.
    pub endpoint: Endpoint,
    /// Target id when the sender is hosted in a directly addressable instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<TargetId>,
    /// URL of the sending instance, if it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SenderInfo {
    /// Sender info for a context that has no target identity.
    pub fn endpoint(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            target_id: None,
            url: None,
        }
    }
}

/// An enumerable foreground instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Direct-send address.
    pub id: TargetId,
    /// Whether the instance currently has a URL (and so can host a listener).
    pub has_url: bool,
}
