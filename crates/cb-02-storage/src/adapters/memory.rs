//! In-memory area storage.
//!
//! All four areas share one change feed. Used by tests and single-process
//! hosts; `managed` is read-only to stores and seeded through `set_managed`.

use crate::domain::{AreaError, AreaName, StorageChange, ValueChange};
use crate::ports::outbound::StorageBackend;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the change feed before slow subscribers start lagging.
const CHANGE_FEED_CAPACITY: usize = 1024;

/// Backend call counters.
///
/// One `set`/`remove` call is one batch, whatever its size.
#[derive(Debug, Default)]
pub struct BackendStats {
    get_calls: AtomicU64,
    set_calls: AtomicU64,
    remove_calls: AtomicU64,
}

impl BackendStats {
    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::Relaxed)
    }

    pub fn set_calls(&self) -> u64 {
        self.set_calls.load(Ordering::Relaxed)
    }

    pub fn remove_calls(&self) -> u64 {
        self.remove_calls.load(Ordering::Relaxed)
    }
}

/// In-memory area storage.
///
/// Four areas, one change feed for all of them. The managed area rejects
/// application writes and is filled through [`set_managed`](Self::set_managed).
/// A write that leaves every value unchanged emits no event.
pub struct InMemoryStorage {
    areas: RwLock<HashMap<AreaName, HashMap<String, Value>>>,
    quotas: HashMap<AreaName, usize>,
    changes: broadcast::Sender<StorageChange>,
    stats: BackendStats,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            areas: RwLock::new(HashMap::new()),
            quotas: HashMap::new(),
            changes,
            stats: BackendStats::default(),
        }
    }

    /// Limit `area` to `bytes`, counted as key length plus JSON length of
    /// each value.
    #[must_use]
    pub fn with_quota(mut self, area: AreaName, bytes: usize) -> Self {
        self.quotas.insert(area, bytes);
        self
    }

    /// Administrator write to the managed area.
    pub fn set_managed(&self, items: HashMap<String, Value>) {
        self.apply_set(AreaName::Managed, items);
    }

    /// Bytes currently used by `area`.
    pub fn bytes_in_use(&self, area: AreaName) -> usize {
        self.areas.read().get(&area).map_or(0, usage)
    }

    /// Snapshot of `area`.
    pub fn snapshot(&self, area: AreaName) -> HashMap<String, Value> {
        self.areas.read().get(&area).cloned().unwrap_or_default()
    }

    pub fn stats(&self) -> &BackendStats {
        &self.stats
    }

    fn apply_set(&self, area: AreaName, items: HashMap<String, Value>) {
        let mut changes = HashMap::new();
        {
            let mut areas = self.areas.write();
            let data = areas.entry(area).or_default();
            for (key, value) in items {
                let old_value = data.insert(key.clone(), value.clone());
                if old_value.as_ref() != Some(&value) {
                    changes.insert(
                        key,
                        ValueChange {
                            old_value,
                            new_value: Some(value),
                        },
                    );
                }
            }
        }
        self.publish(area, changes);
    }

    fn publish(&self, area: AreaName, changes: HashMap<String, ValueChange>) {
        if changes.is_empty() {
            return;
        }
        trace!(area = %area, keys = changes.len(), "Publishing storage change");
        // No subscribers is not an error.
        let _ = self.changes.send(StorageChange { area, changes });
    }
}

fn usage(data: &HashMap<String, Value>) -> usize {
    data.iter()
        .map(|(key, value)| key.len() + value.to_string().len())
        .sum()
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    async fn get(&self, area: AreaName, keys: &[&str]) -> Result<HashMap<String, Value>, AreaError> {
        self.stats.get_calls.fetch_add(1, Ordering::Relaxed);
        let areas = self.areas.read();
        let Some(data) = areas.get(&area) else {
            return Ok(HashMap::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| data.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, area: AreaName, items: HashMap<String, Value>) -> Result<(), AreaError> {
        self.stats.set_calls.fetch_add(1, Ordering::Relaxed);
        if area.is_read_only() {
            return Err(AreaError::ReadOnly(area));
        }

        if let Some(&quota) = self.quotas.get(&area) {
            let areas = self.areas.read();
            let mut candidate = areas.get(&area).cloned().unwrap_or_default();
            candidate.extend(items.iter().map(|(k, v)| (k.clone(), v.clone())));
            let required = usage(&candidate);
            if required > quota {
                return Err(AreaError::QuotaExceeded {
                    area,
                    required,
                    quota,
                });
            }
        }

        self.apply_set(area, items);
        Ok(())
    }

    async fn remove(&self, area: AreaName, keys: &[&str]) -> Result<(), AreaError> {
        self.stats.remove_calls.fetch_add(1, Ordering::Relaxed);
        if area.is_read_only() {
            return Err(AreaError::ReadOnly(area));
        }

        let mut changes = HashMap::new();
        {
            let mut areas = self.areas.write();
            if let Some(data) = areas.get_mut(&area) {
                for key in keys {
                    if let Some(old_value) = data.remove(*key) {
                        changes.insert(
                            key.to_string(),
                            ValueChange {
                                old_value: Some(old_value),
                                new_value: None,
                            },
                        );
                    }
                }
            }
        }
        self.publish(area, changes);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
