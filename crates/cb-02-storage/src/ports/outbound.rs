//! # Outbound Ports (Driven Ports)
//!
//! The area-scoped key-value primitive required by the store engine.
//!
//! Production: the host platform's storage API.
//! Testing: `InMemoryStorage` (adapters/memory.rs)

use crate::domain::{AreaError, AreaName, StorageChange};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Area-scoped key-value storage with a shared change feed.
///
/// Keys live at the top level of each area; stores sharing an area share the
/// key space.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read `keys` from `area`. Absent keys are omitted from the result.
    async fn get(&self, area: AreaName, keys: &[&str]) -> Result<HashMap<String, Value>, AreaError>;

    /// Write every entry of `items` to `area` as one batch.
    async fn set(&self, area: AreaName, items: HashMap<String, Value>) -> Result<(), AreaError>;

    /// Remove `keys` from `area` as one batch.
    async fn remove(&self, area: AreaName, keys: &[&str]) -> Result<(), AreaError>;

    /// Subscribe to changes of every area.
    ///
    /// Events written after this call returns are delivered to the receiver.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}
