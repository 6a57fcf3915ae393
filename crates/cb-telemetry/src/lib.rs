//! # Context Bridge Telemetry
//!
//! Structured logging for every process that hosts a context.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cb_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config).expect("logging");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CB_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CB_JSON_LOGS` | `false` | Emit JSON lines instead of pretty text |
//! | `CB_SERVICE_NAME` | `context-bridge` | Service name attached to the startup event |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{init_logging, try_init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Failed to install subscriber: {0}")]
    SubscriberInit(String),
}
