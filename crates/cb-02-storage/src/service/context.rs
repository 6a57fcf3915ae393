//! Per-process store context.
//!
//! Replaces process-wide singletons: the backend, the codec and the registry
//! are owned by one `StoreContext` and injected into every store it creates.

use super::registry::StoreRegistry;
use super::store::Store;
use crate::adapters::InMemoryStorage;
use crate::domain::{AreaName, StoreError, StoreOptions};
use crate::ports::StorageBackend;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_crypto::{CryptoError, EncryptionConfig, StorageCodec, SECRET_ENV_VAR};
use shared_types::to_wire;
use std::sync::Arc;
use tracing::{debug, info};

/// Creates stores over one backend.
pub struct StoreContext {
    backend: Arc<dyn StorageBackend>,
    codec: Option<Arc<StorageCodec>>,
    registry: Mutex<StoreRegistry>,
}

impl StoreContext {
    /// Context without encryption.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            codec: None,
            registry: Mutex::new(StoreRegistry::new()),
        }
    }

    /// Context over a fresh [`InMemoryStorage`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStorage::new()))
    }

    /// Context using `config` for encrypted stores.
    ///
    /// A config without a secret yields a context whose encrypted stores fail
    /// to construct.
    pub fn from_config(
        backend: Arc<dyn StorageBackend>,
        config: &EncryptionConfig,
    ) -> Result<Self, CryptoError> {
        let context = Self::new(backend);
        if !config.has_secret() {
            return Ok(context);
        }
        Ok(context.with_codec(config.codec()?))
    }

    /// Context reading the secret from the environment.
    pub fn from_env(backend: Arc<dyn StorageBackend>) -> Result<Self, CryptoError> {
        Self::from_config(backend, &EncryptionConfig::from_env())
    }

    /// Use `codec` for encrypted stores.
    #[must_use]
    pub fn with_codec(mut self, codec: StorageCodec) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    pub fn backend(&self) -> Arc<dyn StorageBackend> {
        self.backend.clone()
    }

    /// Returns true if encrypted stores can be created.
    pub fn has_encryption(&self) -> bool {
        self.codec.is_some()
    }

    /// Declare store `id` with `defaults`.
    ///
    /// # Errors
    ///
    /// - `EncryptionUnavailable` if `options.encrypted` and no codec is configured
    /// - `InvalidDefaults` if `defaults` does not serialize to an object
    /// - `DuplicateStore` if `id` is already declared in this context
    pub fn create_store<T>(
        &self,
        id: &str,
        defaults: T,
        options: StoreOptions,
    ) -> Result<Store<T>, StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        let codec = if options.encrypted {
            match &self.codec {
                Some(codec) => Some(codec.clone()),
                None => {
                    return Err(StoreError::EncryptionUnavailable {
                        store: id.to_string(),
                        source: CryptoError::MissingSecret {
                            var: SECRET_ENV_VAR,
                        },
                    })
                }
            }
        } else {
            None
        };

        let defaults = match to_wire(&defaults)? {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::InvalidDefaults {
                    store: id.to_string(),
                    found: kind_of(&other).to_string(),
                })
            }
        };

        let keys: Vec<String> = defaults.keys().cloned().collect();
        self.registry.lock().register(id, keys)?;

        info!(
            store = %id,
            area = %options.area,
            encrypted = options.encrypted,
            keys = defaults.len(),
            "Store declared"
        );

        Ok(Store::new(
            id.to_string(),
            options.area,
            defaults,
            self.backend.clone(),
            codec,
        ))
    }

    /// Store in the durable local area.
    pub fn local_store<T>(&self, id: &str, defaults: T, encrypted: bool) -> Result<Store<T>, StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.create_store(id, defaults, options(AreaName::Local, encrypted))
    }

    /// Store in the durable synced area.
    pub fn sync_store<T>(&self, id: &str, defaults: T, encrypted: bool) -> Result<Store<T>, StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.create_store(id, defaults, options(AreaName::Sync, encrypted))
    }

    /// Store in the administrator-managed, read-only area.
    pub fn managed_store<T>(
        &self,
        id: &str,
        defaults: T,
        encrypted: bool,
    ) -> Result<Store<T>, StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.create_store(id, defaults, options(AreaName::Managed, encrypted))
    }

    /// Store in the volatile session area.
    pub fn session_store<T>(
        &self,
        id: &str,
        defaults: T,
        encrypted: bool,
    ) -> Result<Store<T>, StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.create_store(id, defaults, options(AreaName::Session, encrypted))
    }

    /// The store that declared `key`, if any.
    pub fn store_for_key(&self, key: &str) -> Option<String> {
        self.registry.lock().store_for_key(key).map(str::to_string)
    }

    /// Declared store ids, sorted.
    pub fn store_ids(&self) -> Vec<String> {
        let ids = self
            .registry
            .lock()
            .store_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        debug!(?ids, "Listing stores");
        ids
    }
}

fn options(area: AreaName, encrypted: bool) -> StoreOptions {
    StoreOptions { area, encrypted }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("encryption", &self.codec.is_some())
            .field("stores", &self.registry.lock().len())
            .finish()
    }
}
