//! # Shared Types Crate
//!
//! This crate contains the routing identities, the `Envelope` wire unit and the
//! serialization contract used by every context.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-context types are defined here.
//! - **Envelope Authority**: Routing uses the envelope's `from`/`to` tags; the
//!   payload never carries identity.
//! - **Lossy Boundary**: Everything that crosses a context goes through
//!   [`serialization`], which drops non-data values and stringifies dates.

pub mod envelope;
pub mod errors;
pub mod serialization;

pub use envelope::{Endpoint, Envelope, SenderInfo, TargetId, TargetInfo};
pub use errors::*;
pub use serialization::{from_wire, reduce, to_wire, Empty, ErrorValue, Opaque, Pattern, Timestamp};
