//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for log output.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name reported once at startup
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error, or an `EnvFilter` directive)
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether to include the event target in each line
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "context-bridge".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CB_SERVICE_NAME`: Service name (default: context-bridge)
    /// - `CB_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `CB_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("CB_SERVICE_NAME")
                .unwrap_or_else(|_| "context-bridge".to_string()),

            log_level: env::var("CB_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("CB_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            with_target: true,
        }
    }

    /// Configuration for a named context (e.g. `background`, `view`).
    pub fn for_context(context: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("{}-{}", config.service_name, context);
        config
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
