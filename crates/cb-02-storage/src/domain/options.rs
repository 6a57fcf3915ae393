//! Store options.

use crate::domain::AreaName;

/// Options fixed at store creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Area holding the store's keys.
    pub area: AreaName,
    /// Encrypt values at rest.
    pub encrypted: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            area: AreaName::Local,
            encrypted: false,
        }
    }
}

impl StoreOptions {
    /// Plain store in `area`.
    pub fn in_area(area: AreaName) -> Self {
        Self {
            area,
            encrypted: false,
        }
    }

    /// Same options with encryption turned on.
    #[must_use]
    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }
}
