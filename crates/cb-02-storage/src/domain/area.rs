//! Storage areas.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named persistence domain with its own change stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaName {
    /// Durable, local to the machine.
    Local,
    /// Durable, synchronized across the user's devices.
    Sync,
    /// Written by an administrator; read-only for the application.
    Managed,
    /// Volatile; cleared when the host restarts.
    Session,
}

impl AreaName {
    /// Every area.
    pub const ALL: [AreaName; 4] = [
        AreaName::Local,
        AreaName::Sync,
        AreaName::Managed,
        AreaName::Session,
    ];

    /// Returns true if application writes are rejected.
    #[must_use]
    pub fn is_read_only(self) -> bool {
        self == AreaName::Managed
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AreaName::Local => "local",
            AreaName::Sync => "sync",
            AreaName::Managed => "managed",
            AreaName::Session => "session",
        }
    }
}

impl fmt::Display for AreaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
