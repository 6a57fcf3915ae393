//! # Domain Layer
//!
//! Areas, change events, store options and errors.

pub mod area;
pub mod change;
pub mod errors;
pub mod options;

pub use area::AreaName;
pub use change::{DataChange, StorageChange, ValueChange};
pub use errors::{AreaError, StoreError};
pub use options::StoreOptions;
