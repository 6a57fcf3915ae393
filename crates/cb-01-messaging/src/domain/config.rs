//! Listener configuration.

use shared_types::Endpoint;
use std::env;
use thiserror::Error;

/// Environment variable naming the endpoint tag of the current context.
pub const ENDPOINT_ENV_VAR: &str = "CB_CONTEXT_ENDPOINT";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Environment variable {var} is not set")]
    MissingEndpoint { var: &'static str },

    #[error("Invalid context endpoint '{value}': expected 'background' or 'view'")]
    InvalidEndpoint { value: String },
}

/// Identity of the context a listener runs in.
///
/// Always supplied explicitly; never inferred from the environment's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerConfig {
    endpoint: Endpoint,
}

impl ListenerConfig {
    /// Configuration for a context with tag `endpoint`.
    ///
    /// # Errors
    ///
    /// `Endpoint::All` is a destination only and is rejected.
    pub fn new(endpoint: Endpoint) -> Result<Self, ConfigError> {
        match endpoint {
            Endpoint::All => Err(ConfigError::InvalidEndpoint {
                value: endpoint.to_string(),
            }),
            _ => Ok(Self { endpoint }),
        }
    }

    /// Configuration for the coordinator.
    pub fn background() -> Self {
        Self {
            endpoint: Endpoint::Background,
        }
    }

    /// Configuration for a foreground instance.
    pub fn view() -> Self {
        Self {
            endpoint: Endpoint::View,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CB_CONTEXT_ENDPOINT`: `background` or `view` (required)
    pub fn from_env() -> Result<Self, ConfigError> {
        let value = env::var(ENDPOINT_ENV_VAR).map_err(|_| ConfigError::MissingEndpoint {
            var: ENDPOINT_ENV_VAR,
        })?;
        Self::parse(&value)
    }

    /// Parse an endpoint name (case-insensitive).
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "background" => Ok(Self::background()),
            "view" => Ok(Self::view()),
            _ => Err(ConfigError::InvalidEndpoint {
                value: value.to_string(),
            }),
        }
    }

    /// The listener's own tag.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }
}
