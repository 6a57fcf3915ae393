//! # Ports
//!
//! - `outbound` - the area-scoped key-value primitive stores are built on

pub mod outbound;

pub use outbound::StorageBackend;
