//! # Ports
//!
//! - `inbound` - handler contract implemented by application code
//! - `outbound` - collaborators this crate drives (channel, error sink)

pub mod inbound;
pub mod outbound;

pub use inbound::{Handler, HandlerContext, Reply};
pub use outbound::{ErrorSink, HandlerFailure, RuntimeChannel};
