//! Where a call is delivered.

use shared_types::{Endpoint, TargetId};

/// Destination of an operation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Broadcast with this `to` tag; every listener filters by it.
    Endpoint(Endpoint),
    /// Direct send to one numbered target, bypassing the broadcast.
    Target(TargetId),
    /// Every open foreground instance: one direct send per enumerable target
    /// that has a URL, plus one `VIEW` broadcast for the rest.
    AllViews,
}

impl Destination {
    /// The `to` tag written into envelopes for this destination.
    #[must_use]
    pub fn to_tag(self) -> Endpoint {
        match self {
            Destination::Endpoint(endpoint) => endpoint,
            Destination::Target(_) | Destination::AllViews => Endpoint::View,
        }
    }
}

impl From<Endpoint> for Destination {
    fn from(endpoint: Endpoint) -> Self {
        Destination::Endpoint(endpoint)
    }
}
