//! # Domain Layer
//!
//! Operation definitions, destinations, configuration and errors.

pub mod config;
pub mod destination;
pub mod errors;
pub mod operation;

pub use config::{ConfigError, ListenerConfig, ENDPOINT_ENV_VAR};
pub use destination::Destination;
pub use errors::{HandlerError, MessagingError};
pub use operation::{Operation, Protocol};
