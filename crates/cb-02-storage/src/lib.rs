//! # Typed Stores (cb-02)
//!
//! Named, typed key-value stores layered on area-scoped storage, with
//! optional encryption at rest and per-key change observers.
//!
//! ## Architecture
//!
//! ```text
//! Store<T> ──get/set──→ [StorageCodec] ──→ StorageBackend (area-scoped)
//!    ↑                                            │
//!    └──── observe(key) ←── filter area+key ←── change feed (all areas)
//! ```
//!
//! ## Crate Structure
//!
//! - `domain/` - areas, change events, options, errors
//! - `ports/` - the storage primitive (outbound)
//! - `adapters/` - in-memory storage
//! - `service/` - store engine, registry, context
//!
//! ## Usage
//!
//! ```ignore
//! use cb_02_storage::StoreContext;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Session { count: u32 }
//!
//! let context = StoreContext::in_memory();
//! let store = context.session_store("session", Session { count: 0 }, false)?;
//!
//! let count: u32 = store.get("count").await?;
//! store.set("count", Some(count + 1)).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{BackendStats, InMemoryStorage};
pub use domain::{
    AreaError, AreaName, DataChange, StorageChange, StoreError, StoreOptions, ValueChange,
};
pub use ports::StorageBackend;
pub use service::{ObserverHandle, Store, StoreContext, StoreRegistry};
