//! # Store Service
//!
//! - `context` - per-process owner of backend, codec and registry
//! - `registry` - declared stores and key ownership
//! - `store` - the typed store engine

mod context;
mod registry;
mod store;


pub use context::StoreContext;
pub use registry::StoreRegistry;
pub use store::{ObserverHandle, Store};
