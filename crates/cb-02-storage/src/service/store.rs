//! # Store Engine
//!
//! A store is a typed view over some top-level keys of one area.
//!
//! ## Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Declared keys | Every key has a default; other keys are rejected |
//! | Single init | Concurrent first accesses share one initialization |
//! | Batched writes | `set_many` issues at most one remove and one set call |
//! | Scoped observers | Observers only see changes to their area and key |

use crate::domain::{AreaName, DataChange, StoreError};
use crate::ports::StorageBackend;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use shared_crypto::StorageCodec;
use shared_types::{from_wire, to_wire, SerializationError};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::AbortHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

/// Handle of one observer registration.
///
/// Removal must present the handle returned by [`Store::observe`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ObserverHandle {
    store: String,
    id: u64,
}

impl ObserverHandle {
    /// Id of the store the observer belongs to.
    pub fn store(&self) -> &str {
        &self.store
    }
}

/// Typed, optionally encrypted key-value store.
///
/// `T` is the defaults type; its top-level fields are the store's keys.
pub struct Store<T> {
    id: String,
    area: AreaName,
    defaults: Map<String, Value>,
    backend: Arc<dyn StorageBackend>,
    codec: Option<Arc<StorageCodec>>,
    initialized: OnceCell<()>,
    observers: Mutex<HashMap<u64, AbortHandle>>,
    next_observer: AtomicU64,
    _data: PhantomData<fn() -> T>,
}

impl<T> Store<T>
where
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(
        id: String,
        area: AreaName,
        defaults: Map<String, Value>,
        backend: Arc<dyn StorageBackend>,
        codec: Option<Arc<StorageCodec>>,
    ) -> Self {
        Self {
            id,
            area,
            defaults,
            backend,
            codec,
            initialized: OnceCell::new(),
            observers: Mutex::new(HashMap::new()),
            next_observer: AtomicU64::new(0),
            _data: PhantomData,
        }
    }

    /// Debugging identifier, unique within its `StoreContext`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn area(&self) -> AreaName {
        self.area
    }

    pub fn is_encrypted(&self) -> bool {
        self.codec.is_some()
    }

    /// Returns true once initialization has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// Declared keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        self.defaults.keys().map(String::as_str).collect()
    }

    /// Write the default of every absent key, in one batch.
    ///
    /// Runs at most once successfully; concurrent callers share one run.
    /// On the managed area nothing is written.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        self.initialized
            .get_or_try_init(|| self.run_initialize())
            .await
            .map(|_| ())
    }

    async fn run_initialize(&self) -> Result<(), StoreError> {
        if self.area.is_read_only() {
            debug!(store = %self.id, area = %self.area, "Read-only area; defaults are read-through");
            return Ok(());
        }

        let keys = self.keys();
        let stored = self.backend.get(self.area, &keys).await?;

        let mut missing = HashMap::new();
        for (key, default) in &self.defaults {
            if !stored.contains_key(key) {
                missing.insert(key.clone(), self.encode(default)?);
            }
        }

        let written = missing.len();
        if written > 0 {
            self.backend.set(self.area, missing).await?;
        }

        debug!(store = %self.id, area = %self.area, written, "Store initialized");
        Ok(())
    }

    /// Read one key.
    ///
    /// A removed key reads as `null` (so `Option` values read as `None`); on
    /// the managed area an absent key reads as its default.
    pub async fn get<V>(&self, key: &str) -> Result<V, StoreError>
    where
        V: DeserializeOwned,
    {
        self.check_key(key)?;
        self.initialize().await?;

        let mut stored = self.backend.get(self.area, &[key]).await?;
        let value = self.resolve(key, stored.remove(key));
        Ok(from_wire(value)?)
    }

    /// Read every key into `T`.
    pub async fn get_all(&self) -> Result<T, StoreError> {
        self.initialize().await?;

        let keys = self.keys();
        let mut stored = self.backend.get(self.area, &keys).await?;

        let mut all = Map::with_capacity(keys.len());
        for key in keys {
            let value = self.resolve(key, stored.remove(key));
            all.insert(key.to_string(), value);
        }
        Ok(from_wire(Value::Object(all))?)
    }

    /// Write one key. `None` removes it.
    pub async fn set<V>(&self, key: &str, value: Option<V>) -> Result<(), StoreError>
    where
        V: Serialize,
    {
        let value = value.map(|v| to_wire(&v)).transpose()?;
        self.set_many([(key, value)]).await
    }

    /// Remove one key.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.set_many([(key, None)]).await
    }

    /// Write several keys: one remove call for the `None` entries and one set
    /// call for the rest. An empty side issues no call.
    pub async fn set_many<I, K>(&self, entries: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (K, Option<Value>)>,
        K: AsRef<str>,
    {
        let mut to_set = HashMap::new();
        let mut to_remove = Vec::new();
        for (key, value) in entries {
            let key = key.as_ref();
            self.check_key(key)?;
            match value {
                Some(value) => {
                    to_set.insert(key.to_string(), self.encode(&value)?);
                }
                None => to_remove.push(key.to_string()),
            }
        }

        self.initialize().await?;

        if !to_remove.is_empty() {
            let keys: Vec<&str> = to_remove.iter().map(String::as_str).collect();
            self.backend.remove(self.area, &keys).await?;
        }
        if !to_set.is_empty() {
            self.backend.set(self.area, to_set).await?;
        }

        debug!(store = %self.id, removed = to_remove.len(), "Store updated");
        Ok(())
    }

    /// Call `callback` on every change of `key` in this store's area.
    ///
    /// Values are decrypted before the callback runs. Events written after
    /// this returns are observed.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime; the observer runs as a
    /// spawned task.
    pub fn observe<V, F>(&self, key: &str, callback: F) -> Result<ObserverHandle, StoreError>
    where
        V: DeserializeOwned + Send + 'static,
        F: Fn(DataChange<V>) + Send + Sync + 'static,
    {
        self.check_key(key)?;

        let mut feed = BroadcastStream::new(self.backend.subscribe());
        let area = self.area;
        let watched = key;
        let key = key.to_string();
        let codec = self.codec.clone();
        let store = self.id.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = feed.next().await {
                let change = match event {
                    Ok(change) => change,
                    Err(BroadcastStreamRecvError::Lagged(missed)) => {
                        warn!(store = %store, key = %key, missed, "Observer lagged; change events dropped");
                        continue;
                    }
                };
                if change.area != area {
                    continue;
                }
                let Some(raw) = change.changes.get(&key) else {
                    continue;
                };

                let (old_value, new_value) = match &codec {
                    Some(codec) => tokio::join!(
                        async { raw.old_value.as_ref().map(|v| codec.decrypt(v)) },
                        async { raw.new_value.as_ref().map(|v| codec.decrypt(v)) },
                    ),
                    None => (raw.old_value.clone(), raw.new_value.clone()),
                };

                match decode_change::<V>(old_value, new_value) {
                    Ok(change) => callback(change),
                    Err(e) => {
                        warn!(store = %store, key = %key, error = %e, "Change does not match the key's type");
                    }
                }
            }
        });

        let id = self.next_observer.fetch_add(1, Ordering::Relaxed);
        self.observers.lock().insert(id, task.abort_handle());
        debug!(store = %self.id, key = %watched, observer = id, "Observer added");

        Ok(ObserverHandle {
            store: self.id.clone(),
            id,
        })
    }

    /// Remove an observer.
    ///
    /// # Returns
    ///
    /// `false` if the handle belongs to another store or was already removed.
    pub fn remove_observer(&self, handle: ObserverHandle) -> bool {
        if handle.store != self.id {
            return false;
        }
        match self.observers.lock().remove(&handle.id) {
            Some(task) => {
                task.abort();
                debug!(store = %self.id, observer = handle.id, "Observer removed");
                true
            }
            None => false,
        }
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    fn check_key(&self, key: &str) -> Result<(), StoreError> {
        if self.defaults.contains_key(key) {
            Ok(())
        } else {
            Err(StoreError::UnknownKey {
                store: self.id.clone(),
                key: key.to_string(),
            })
        }
    }

    fn encode(&self, value: &Value) -> Result<Value, StoreError> {
        match &self.codec {
            Some(codec) => Ok(Value::String(codec.encrypt(value)?)),
            None => Ok(value.clone()),
        }
    }

    fn resolve(&self, key: &str, stored: Option<Value>) -> Value {
        match stored {
            Some(raw) => match &self.codec {
                Some(codec) => codec.decrypt(&raw),
                None => raw,
            },
            None if self.area.is_read_only() => {
                self.defaults.get(key).cloned().unwrap_or(Value::Null)
            }
            None => Value::Null,
        }
    }
}

fn decode_change<V: DeserializeOwned>(
    old_value: Option<Value>,
    new_value: Option<Value>,
) -> Result<DataChange<V>, SerializationError> {
    Ok(DataChange {
        old_value: old_value.map(from_wire).transpose()?,
        new_value: new_value.map(from_wire).transpose()?,
    })
}

impl<T> Drop for Store<T> {
    fn drop(&mut self) {
        for (_, task) in self.observers.lock().drain() {
            task.abort();
        }
    }
}

impl<T> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("area", &self.area)
            .field("keys", &self.defaults.keys().collect::<Vec<_>>())
            .field("encrypted", &self.codec.is_some())
            .field("initialized", &self.initialized.initialized())
            .finish()
    }
}
